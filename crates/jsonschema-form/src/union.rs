use serde_json::{Map, Value};

use crate::error::PreprocessError;
use crate::node::first_supported_branch;
use crate::path::{Keyword, SchemaPath};
use crate::traverse::try_traverse_mut;

/// Collapse every untyped `anyOf`/`oneOf` node into its first branch that is
/// not `deprecated: true`.
///
/// The branch's top-level attributes are copied onto the node, then `anyOf`
/// and `oneOf` are removed. `allOf` is left alone.
///
/// # Errors
///
/// Returns [`PreprocessError::AllBranchesDeprecated`] when no branch is usable.
pub fn resolve_unions(mut schema: Value) -> Result<Value, PreprocessError> {
    try_traverse_mut(&mut schema, &mut resolve_node)?;
    Ok(schema)
}

fn resolve_node(node: &mut Map<String, Value>, path: &SchemaPath) -> Result<(), PreprocessError> {
    if node.contains_key("type") {
        return Ok(());
    }
    let Some(keyword) = [Keyword::AnyOf, Keyword::OneOf]
        .into_iter()
        .find(|keyword| node.get(keyword.as_str()).is_some_and(Value::is_array))
    else {
        return Ok(());
    };

    let branch = node
        .get(keyword.as_str())
        .and_then(Value::as_array)
        .and_then(|branches| first_supported_branch(branches))
        .cloned()
        .ok_or_else(|| PreprocessError::AllBranchesDeprecated {
            path: path.clone(),
            keyword,
        })?;

    node.shift_remove(Keyword::AnyOf.as_str());
    node.shift_remove(Keyword::OneOf.as_str());
    tracing::debug!(%path, %keyword, "resolved union to its first supported branch");
    node.extend(branch);
    Ok(())
}
