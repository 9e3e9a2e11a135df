//! Classification of schema nodes and lookup of the subschemas that govern
//! parts of a value.

use serde_json::{Map, Value};

use crate::TRANSFORMED_PROPERTY_KEY;
use crate::error::RefError;

/// Maximum number of `$ref`/union hops followed before giving up.
pub const REF_DEPTH_LIMIT: usize = 32;

/// Where the entries of a map-shaped object take their schema from.
///
/// `additionalProperties` wins over `patternProperties`; among
/// `patternProperties` only the first declared pattern is honoured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapEntries<'a> {
    pub schema: &'a Value,
    /// The `patternProperties` regex the schema was taken from.
    pub pattern: Option<&'a str>,
}

impl<'a> MapEntries<'a> {
    pub fn of(node: &'a Map<String, Value>) -> Option<Self> {
        if let Some(schema) = node.get("additionalProperties").filter(|s| s.is_object()) {
            return Some(Self {
                schema,
                pattern: None,
            });
        }
        let (pattern, schema) = node.get("patternProperties")?.as_object()?.iter().next()?;
        schema.is_object().then_some(Self {
            schema,
            pattern: Some(pattern),
        })
    }
}

/// How a schema node reaches its children.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchemaNode<'a> {
    /// `$ref` to another node of the document.
    Reference(&'a str),
    /// Object-typed node describing an open string-keyed dictionary.
    Map(MapEntries<'a>),
    /// Object with named properties (explicitly typed or not).
    Object(&'a Map<String, Value>),
    Array(&'a Map<String, Value>),
    /// Untyped `anyOf`/`oneOf` node.
    Union(&'a [Value]),
    Scalar,
}

impl<'a> SchemaNode<'a> {
    pub fn classify(node: &'a Map<String, Value>) -> Self {
        if let Some(reference) = node.get("$ref").and_then(Value::as_str) {
            return Self::Reference(reference);
        }
        let untyped = !node.contains_key("type");
        if has_type(node, "object") {
            return MapEntries::of(node).map_or(Self::Object(node), Self::Map);
        }
        if untyped
            && ["properties", "additionalProperties", "patternProperties"]
                .iter()
                .any(|keyword| node.contains_key(*keyword))
        {
            return Self::Object(node);
        }
        if has_type(node, "array") || (untyped && node.contains_key("items")) {
            return Self::Array(node);
        }
        if untyped && let Some(branches) = union_branches(node) {
            return Self::Union(branches);
        }
        Self::Scalar
    }
}

/// Whether `type` names `name`, either directly or in a list of types.
pub(crate) fn has_type(node: &Map<String, Value>, name: &str) -> bool {
    match node.get("type") {
        Some(Value::String(ty)) => ty == name,
        Some(Value::Array(types)) => types.iter().any(|ty| ty.as_str() == Some(name)),
        _ => false,
    }
}

/// Branches of an `anyOf` (preferred) or `oneOf` keyword.
pub(crate) fn union_branches(node: &Map<String, Value>) -> Option<&[Value]> {
    ["anyOf", "oneOf"]
        .iter()
        .find_map(|keyword| node.get(*keyword)?.as_array())
        .map(Vec::as_slice)
}

/// First object branch not marked `deprecated: true`.
pub(crate) fn first_supported_branch(branches: &[Value]) -> Option<&Map<String, Value>> {
    branches
        .iter()
        .filter_map(Value::as_object)
        .find(|branch| branch.get("deprecated") != Some(&Value::Bool(true)))
}

/// Resolve a local reference (`#`, `#/$defs/Name`, ...) against `root`.
pub fn resolve_ref<'a>(root: &'a Value, reference: &str) -> Option<&'a Value> {
    let pointer = reference.strip_prefix('#')?;
    if pointer.is_empty() {
        Some(root)
    } else {
        root.pointer(pointer)
    }
}

/// Follow `$ref`s and untyped unions until a node that describes a value
/// directly. Boolean schemas yield `None`.
pub(crate) fn effective_node<'a>(
    schema: &'a Value,
    root: &'a Value,
) -> Result<Option<&'a Map<String, Value>>, RefError> {
    match schema {
        Value::Object(node) => effective_map(node, root),
        _ => Ok(None),
    }
}

pub(crate) fn effective_map<'a>(
    mut node: &'a Map<String, Value>,
    root: &'a Value,
) -> Result<Option<&'a Map<String, Value>>, RefError> {
    for _ in 0..REF_DEPTH_LIMIT {
        match SchemaNode::classify(node) {
            SchemaNode::Reference(reference) => {
                let target = resolve_ref(root, reference)
                    .ok_or_else(|| RefError::Unresolved(reference.to_owned()))?;
                let Some(target) = target.as_object() else {
                    return Ok(None);
                };
                node = target;
            }
            SchemaNode::Union(branches) => match first_supported_branch(branches) {
                Some(branch) => node = branch,
                None => return Ok(None),
            },
            SchemaNode::Map(_)
            | SchemaNode::Object(_)
            | SchemaNode::Array(_)
            | SchemaNode::Scalar => {
                return Ok(Some(node));
            }
        }
    }
    Err(RefError::TooDeep)
}

/// Subschema governing member `key` of an object value: the named property,
/// else the map entry schema.
pub(crate) fn member_schema<'a>(node: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    node.get("properties")
        .and_then(|properties| properties.get(key))
        .or_else(|| MapEntries::of(node).map(|entries| entries.schema))
}

/// Subschema governing the `index`th element of an array value.
pub(crate) fn item_schema(node: &Map<String, Value>, index: usize) -> Option<&Value> {
    match node.get("items")? {
        Value::Array(tuple) => tuple.get(index),
        items if items.is_object() => Some(items),
        _ => None,
    }
}

/// Whether a map entry with this schema has its members spread into the
/// generated item, as opposed to being wrapped in the value property.
pub(crate) fn spreads_entries(schema: &Value, root: &Value) -> Result<bool, RefError> {
    Ok(effective_node(schema, root)?.is_some_and(|node| {
        has_type(node, "object") && matches!(SchemaNode::classify(node), SchemaNode::Object(_))
    }))
}

/// Item schema of an array node that was generated from a map.
pub(crate) fn transformed_items<'a>(
    node: &'a Map<String, Value>,
    root: &'a Value,
) -> Result<Option<&'a Map<String, Value>>, RefError> {
    if !has_type(node, "array") {
        return Ok(None);
    }
    let Some(items) = node.get("items") else {
        return Ok(None);
    };
    let items = effective_node(items, root)?;
    Ok(items.filter(|items| {
        items
            .get("properties")
            .and_then(Value::as_object)
            .is_some_and(|properties| properties.contains_key(TRANSFORMED_PROPERTY_KEY))
    }))
}

/// Whether `schema` is an array schema synthesized from a map-shaped schema.
///
/// Unresolvable references count as "not transformed".
pub fn is_transformed_schema(schema: &Value, root: &Value) -> bool {
    matches!(
        effective_node(schema, root).and_then(|node| match node {
            Some(node) => transformed_items(node, root),
            None => Ok(None),
        }),
        Ok(Some(_))
    )
}
