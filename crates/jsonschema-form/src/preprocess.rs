use serde_json::Value;

use crate::defaults::clean_implicit_defaults;
use crate::error::PreprocessError;
use crate::ids::{IdGenerator, SequentialIds};
use crate::internal::inline_internal_defaults;
use crate::map_to_array::transform_maps;
use crate::prune::prune_fields;
use crate::union::resolve_unions;

/// Knobs of [`preprocess_schema_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessOptions {
    /// Dotted paths of subtrees to remove before anything else runs.
    pub fields_to_remove: Vec<String>,
    pub clean_implicit_defaults: bool,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            fields_to_remove: Vec::new(),
            clean_implicit_defaults: true,
        }
    }
}

/// Prepare `schema` for a form renderer, removing `fields_to_remove` first.
///
/// Synthesized `$defs` entries are named `mapEntry1`, `mapEntry2`, ...
///
/// # Errors
///
/// See [`preprocess_schema_with`].
pub fn preprocess_schema<S: AsRef<str>>(
    schema: &Value,
    fields_to_remove: &[S],
) -> Result<Value, PreprocessError> {
    let options = PreprocessOptions {
        fields_to_remove: fields_to_remove
            .iter()
            .map(|path| path.as_ref().to_owned())
            .collect(),
        ..PreprocessOptions::default()
    };
    preprocess_schema_with(schema, &options, &mut SequentialIds::default())
}

/// Run the preprocessing passes in order: field pruning, `internal` default
/// inlining, union resolution, map-to-array rewriting, then (unless disabled)
/// implicit default cleaning.
///
/// The input is left untouched.
///
/// # Errors
///
/// Fails when every branch of an untyped union is deprecated, or when a
/// `$ref` the passes depend on cannot be resolved.
#[tracing::instrument(skip_all, fields(remove = options.fields_to_remove.len()))]
pub fn preprocess_schema_with(
    schema: &Value,
    options: &PreprocessOptions,
    ids: &mut dyn IdGenerator,
) -> Result<Value, PreprocessError> {
    let schema = prune_fields(schema.clone(), &options.fields_to_remove);
    let schema = inline_internal_defaults(schema);
    let schema = resolve_unions(schema)?;
    let schema = transform_maps(schema, ids)?;
    if options.clean_implicit_defaults {
        clean_implicit_defaults(schema)
    } else {
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn runs_passes_in_order() {
        let schema = json!({
            "type": "object",
            "properties": {
                "labels": {
                    "anyOf": [
                        {"deprecated": true, "type": "string"},
                        {"type": "object", "additionalProperties": {"type": "string"}}
                    ]
                },
                "unsupported": {"type": "string"},
                "internal": {
                    "properties": {"labels": {"default": {"team": "a", "empty": ""}}}
                }
            }
        });
        let out = preprocess_schema(&schema, &["properties.unsupported"]).expect("preprocessable");
        assert_eq!(
            out,
            json!({
                "type": "object",
                "properties": {
                    "labels": {
                        "default": [
                            {"transformedPropertyKey": "team", "transformedPropertyValue": "a"},
                            {"transformedPropertyKey": "empty", "transformedPropertyValue": ""}
                        ],
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["transformedPropertyKey", "transformedPropertyValue"],
                            "properties": {
                                "transformedPropertyKey": {"type": "string", "title": "Key"},
                                "transformedPropertyValue": {"type": "string", "title": "Value"}
                            }
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn does_not_mutate_input() {
        let schema = json!({"type": "object", "additionalProperties": {"type": "string"}});
        let before = schema.clone();
        preprocess_schema::<&str>(&schema, &[]).expect("preprocessable");
        assert_eq!(schema, before);
    }

    #[test]
    fn implicit_default_cleaning_can_be_skipped() {
        let schema = json!({
            "type": "object",
            "default": {"name": ""},
            "properties": {"name": {"type": "string"}}
        });
        let options = PreprocessOptions {
            clean_implicit_defaults: false,
            ..PreprocessOptions::default()
        };
        let kept = preprocess_schema_with(&schema, &options, &mut SequentialIds::default())
            .expect("preprocessable");
        assert_eq!(kept, schema);

        let cleaned = preprocess_schema::<&str>(&schema, &[]).expect("preprocessable");
        assert_eq!(cleaned["default"], json!({}));
    }
}
