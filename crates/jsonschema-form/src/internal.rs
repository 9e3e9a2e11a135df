use serde_json::Value;

use crate::traverse::traverse_mut;

/// Root property whose subtree mirrors the document and carries defaults.
pub const INTERNAL_PROPERTY: &str = "internal";

/// Copy `default`s found under `properties.internal` onto the nodes at the
/// mirrored paths, then drop the `internal` property.
///
/// Defaults inlined this way replace any default already on the node.
/// Schemas without `properties.internal` are returned unchanged.
pub fn inline_internal_defaults(mut schema: Value) -> Value {
    let Some(internal) = take_internal(&mut schema) else {
        return schema;
    };

    traverse_mut(&mut schema, |node, path| {
        if path.is_root() {
            return;
        }
        if let Some(default) = internal
            .pointer(&path.to_pointer())
            .and_then(|mirror| mirror.get("default"))
        {
            tracing::trace!(%path, "inlining internal default");
            node.insert("default".to_owned(), default.clone());
        }
    });
    schema
}

/// Detach `properties.internal` from the root, along with its `required` entry.
fn take_internal(schema: &mut Value) -> Option<Value> {
    let root = schema.as_object_mut()?;
    let internal = root
        .get_mut("properties")?
        .as_object_mut()?
        .shift_remove(INTERNAL_PROPERTY)?;
    if let Some(Value::Array(required)) = root.get_mut("required") {
        required.retain(|name| name.as_str() != Some(INTERNAL_PROPERTY));
    }
    Some(internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inlines_mirrored_defaults() {
        let schema = json!({
            "type": "object",
            "required": ["internal", "replicas"],
            "properties": {
                "replicas": {"type": "integer"},
                "labels": {"type": "object", "default": {"old": "value"}},
                "internal": {
                    "type": "object",
                    "properties": {
                        "replicas": {"default": 3},
                        "labels": {"default": {"team": "platform"}}
                    }
                }
            }
        });
        assert_eq!(
            inline_internal_defaults(schema),
            json!({
                "type": "object",
                "required": ["replicas"],
                "properties": {
                    "replicas": {"type": "integer", "default": 3},
                    "labels": {"type": "object", "default": {"team": "platform"}}
                }
            })
        );
    }

    #[test]
    fn ignores_root_default_of_internal() {
        let schema = json!({
            "default": {"keep": true},
            "properties": {"internal": {"default": {"ignored": true}}}
        });
        assert_eq!(
            inline_internal_defaults(schema),
            json!({"default": {"keep": true}, "properties": {}})
        );
    }

    #[test]
    fn no_internal_is_identity() {
        let schema = json!({"properties": {"a": {"type": "string"}}});
        assert_eq!(inline_internal_defaults(schema.clone()), schema);
    }
}
