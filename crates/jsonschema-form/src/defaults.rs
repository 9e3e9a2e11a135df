use serde_json::Value;

use crate::clean::{CleanOptions, clean_node_value};
use crate::error::PreprocessError;
use crate::node::has_type;
use crate::traverse::try_traverse_mut;

/// Options used to strip object and array defaults down to what their
/// descendants do not already imply.
const IMPLICIT_DEFAULTS: CleanOptions = CleanOptions {
    empty_arrays: true,
    empty_objects: true,
    empty_strings: false,
    null_values: true,
    clean_default_values: true,
    unknown_members: false,
};

/// Remove the parts of every object or array `default` that merely repeat
/// defaults implied by the node's descendants.
///
/// # Errors
///
/// Fails when a `$ref` below a cleaned node cannot be resolved.
#[tracing::instrument(skip_all)]
pub fn clean_implicit_defaults(mut schema: Value) -> Result<Value, PreprocessError> {
    let root = schema.clone();
    try_traverse_mut(&mut schema, &mut |node, path| {
        if !(has_type(node, "object") || has_type(node, "array")) {
            return Ok(());
        }
        let Some(default) = node
            .get("default")
            .filter(|default| default.is_object() || default.is_array())
        else {
            return Ok(());
        };
        let result = clean_node_value(default, node, &root, &IMPLICIT_DEFAULTS);
        let cleaned = result.map_err(|source| PreprocessError::Reference {
            path: path.clone(),
            source,
        })?;
        if node.get("default") != Some(&cleaned) {
            tracing::trace!(%path, "cleaned implied default values");
            node.insert("default".to_owned(), cleaned);
        }
        Ok(())
    })?;
    Ok(schema)
}
