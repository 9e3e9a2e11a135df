//! Rewrites map-shaped object schemas (`additionalProperties` /
//! `patternProperties`) into arrays of key/value entries, and reshapes values
//! the same way.
//!
//! ```text
//! {type: object, additionalProperties: {type: string}}
//!   => {type: array, items: {type: object,
//!                            required: [transformedPropertyKey, transformedPropertyValue],
//!                            properties: {transformedPropertyKey: {type: string, title: Key},
//!                                         transformedPropertyValue: {type: string, title: Value}}}}
//! ```
//!
//! When the entry schema is itself an object with named properties, those
//! properties are spread into the item next to the key instead of being
//! wrapped under `transformedPropertyValue`.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value, json};

use crate::error::{PreprocessError, RefError};
use crate::ids::IdGenerator;
use crate::node::{
    MapEntries, SchemaNode, effective_map, effective_node, has_type, item_schema, member_schema,
    spreads_entries,
};
use crate::path::SchemaPath;
use crate::traverse::try_traverse_mut;
use crate::{TRANSFORMED_PROPERTY_KEY, TRANSFORMED_PROPERTY_VALUE};

/// Transform every map-shaped node of `schema` and every `default` below it.
///
/// Defaults are reshaped first, against the untouched schema, so values and
/// schema always agree on whether an entry is spread or wrapped. Entry
/// schemas given as a `$ref` to an object get a synthesized `$defs` entry,
/// named by `ids`, that carries the key property.
///
/// # Errors
///
/// Fails when a `$ref` that decides the shape of an entry cannot be resolved.
#[tracing::instrument(skip_all)]
pub fn transform_maps(
    mut schema: Value,
    ids: &mut dyn IdGenerator,
) -> Result<Value, PreprocessError> {
    reshape_defaults(&mut schema)?;

    let snapshot = schema.clone();
    let mut rewriter = MapRewriter::new(&snapshot, ids);
    try_traverse_mut(&mut schema, &mut |node, path| rewriter.rewrite(node, path))?;
    rewriter.synthesize_defs(&mut schema)?;
    Ok(schema)
}

/// Reshape `value`, which conforms to the untransformed `schema`, into the
/// shape [`transform_maps`] gives that schema.
///
/// Useful to prefill a form from an existing document. Parts of the value
/// without a governing schema are copied unchanged.
///
/// # Errors
///
/// Returns a [`RefError`] when a `$ref` on the way cannot be resolved.
pub fn to_form_value(value: &Value, schema: &Value, root: &Value) -> Result<Value, RefError> {
    match effective_node(schema, root)? {
        Some(node) => form_value(value, node, root),
        None => Ok(value.clone()),
    }
}

fn form_value(value: &Value, node: &Map<String, Value>, root: &Value) -> Result<Value, RefError> {
    let Some(node) = effective_map(node, root)? else {
        return Ok(value.clone());
    };
    match (value, SchemaNode::classify(node)) {
        (Value::Object(members), SchemaNode::Map(entries)) => {
            let spread = spreads_entries(entries.schema, root)?;
            members
                .iter()
                .map(|(key, member)| -> Result<Value, RefError> {
                    let member = to_form_value(member, entries.schema, root)?;
                    Ok(form_entry(key, member, spread))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        (Value::Object(members), SchemaNode::Object(node)) => members
            .iter()
            .map(|(key, member)| -> Result<(String, Value), RefError> {
                let member = match member_schema(node, key) {
                    Some(schema) => to_form_value(member, schema, root)?,
                    None => member.clone(),
                };
                Ok((key.clone(), member))
            })
            .collect::<Result<Map<_, _>, _>>()
            .map(Value::Object),
        (Value::Array(items), SchemaNode::Array(node)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| match item_schema(node, index) {
                Some(schema) => to_form_value(item, schema, root),
                None => Ok(item.clone()),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        _ => Ok(value.clone()),
    }
}

fn form_entry(key: &str, value: Value, spread: bool) -> Value {
    let mut entry = Map::new();
    entry.insert(
        TRANSFORMED_PROPERTY_KEY.to_owned(),
        Value::String(key.to_owned()),
    );
    match value {
        Value::Object(members) if spread => entry.extend(members),
        value => {
            entry.insert(TRANSFORMED_PROPERTY_VALUE.to_owned(), value);
        }
    }
    Value::Object(entry)
}

fn reshape_defaults(schema: &mut Value) -> Result<(), PreprocessError> {
    let root = schema.clone();
    try_traverse_mut(schema, &mut |node, path| {
        let Some(default) = node.get("default") else {
            return Ok(());
        };
        let reshaped =
            form_value(default, node, &root).map_err(|source| PreprocessError::Reference {
                path: path.clone(),
                source,
            })?;
        if node.get("default") != Some(&reshaped) {
            tracing::trace!(%path, "reshaped default");
            node.insert("default".to_owned(), reshaped);
        }
        Ok(())
    })
}

/// Generated names tried before falling back to suffixing the last one.
const MAX_ID_ATTEMPTS: usize = 16;

/// A `$defs` entry to add once the walk is over.
struct PendingDef {
    name: String,
    reference: String,
    key: Value,
    path: SchemaPath,
}

struct MapRewriter<'a, 'g> {
    /// The schema before any node was rewritten.
    root: &'a Value,
    ids: &'g mut dyn IdGenerator,
    taken: HashSet<String>,
    /// Synthesized definition names by (`$ref`, key schema).
    synthesized: HashMap<(String, String), String>,
    pending: Vec<PendingDef>,
}

impl<'a, 'g> MapRewriter<'a, 'g> {
    fn new(root: &'a Value, ids: &'g mut dyn IdGenerator) -> Self {
        let taken = root
            .get("$defs")
            .and_then(Value::as_object)
            .map(|defs| defs.keys().cloned().collect())
            .unwrap_or_default();
        Self {
            root,
            ids,
            taken,
            synthesized: HashMap::new(),
            pending: Vec::new(),
        }
    }

    fn rewrite(
        &mut self,
        node: &mut Map<String, Value>,
        path: &SchemaPath,
    ) -> Result<(), PreprocessError> {
        if !has_type(node, "object") {
            return Ok(());
        }
        let Some(entries) = MapEntries::of(node) else {
            return Ok(());
        };
        let key = key_schema(node, entries.pattern);
        let value = entries.schema.clone();
        let items = self.entry_schema(key, value, path)?;
        tracing::debug!(%path, "rewriting map-shaped object into an array");
        reshape_node(node, items, path);
        Ok(())
    }

    fn entry_schema(
        &mut self,
        key: Value,
        value: Value,
        path: &SchemaPath,
    ) -> Result<Value, PreprocessError> {
        let spread =
            spreads_entries(&value, self.root).map_err(|source| PreprocessError::Reference {
                path: path.clone(),
                source,
            })?;
        if !spread {
            return Ok(wrapped_entry(key, value));
        }
        if let Some(reference) = value.get("$ref").and_then(Value::as_str) {
            let name = self.synthesized_def(reference, key, path);
            return Ok(json!({ "$ref": format!("#/$defs/{name}") }));
        }
        match value {
            Value::Object(value) => Ok(Value::Object(spread_entry(key, value))),
            value => Ok(wrapped_entry(key, value)),
        }
    }

    /// Name of the definition combining the `reference` target with `key`,
    /// reusing an earlier one when the same pair was seen before.
    fn synthesized_def(&mut self, reference: &str, key: Value, path: &SchemaPath) -> String {
        let dedupe = (reference.to_owned(), key.to_string());
        if let Some(name) = self.synthesized.get(&dedupe) {
            return name.clone();
        }
        let name = self.unique_name();
        tracing::debug!(%path, reference, %name, "synthesizing map entry definition");
        self.synthesized.insert(dedupe, name.clone());
        self.pending.push(PendingDef {
            name: name.clone(),
            reference: reference.to_owned(),
            key,
            path: path.clone(),
        });
        name
    }

    /// Next generated name not already used in `$defs`.
    fn unique_name(&mut self) -> String {
        let mut name = self.ids.next_id();
        let mut attempt = 1;
        while self.taken.contains(&name) {
            attempt += 1;
            name = if attempt <= MAX_ID_ATTEMPTS {
                self.ids.next_id()
            } else {
                format!("{name}_{attempt}")
            };
        }
        self.taken.insert(name.clone());
        name
    }

    /// Add the pending definitions to the root `$defs`, built from their
    /// targets as they look after the rewrite.
    fn synthesize_defs(self, schema: &mut Value) -> Result<(), PreprocessError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let mut defs = Vec::with_capacity(self.pending.len());
        for pending in self.pending {
            let reference = json!({ "$ref": pending.reference });
            let target = effective_node(&reference, schema)
                .map_err(|source| PreprocessError::Reference {
                    path: pending.path.clone(),
                    source,
                })?
                .ok_or_else(|| PreprocessError::Reference {
                    path: pending.path,
                    source: RefError::Unresolved(pending.reference.clone()),
                })?;
            defs.push((
                pending.name,
                Value::Object(spread_entry(pending.key, target.clone())),
            ));
        }

        let Some(root) = schema.as_object_mut() else {
            return Ok(());
        };
        if let Some(existing) = root
            .entry("$defs")
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
        {
            existing.extend(defs);
        }
        Ok(())
    }
}

/// Schema of the key property: a string, constrained by the entry pattern
/// and by `propertyNames` when present.
fn key_schema(node: &Map<String, Value>, pattern: Option<&str>) -> Value {
    let mut key = Map::new();
    key.insert("type".to_owned(), json!("string"));
    key.insert("title".to_owned(), json!("Key"));
    if let Some(pattern) = pattern {
        key.insert("pattern".to_owned(), json!(pattern));
    }
    if let Some(Value::Object(names)) = node.get("propertyNames") {
        for (keyword, value) in names {
            if keyword != "type" {
                key.entry(keyword.clone()).or_insert_with(|| value.clone());
            }
        }
    }
    Value::Object(key)
}

/// `{type: object, required: [key, value], properties: {key, value}}`
fn wrapped_entry(key: Value, mut value: Value) -> Value {
    if let Some(value) = value.as_object_mut() {
        value.entry("title").or_insert_with(|| json!("Value"));
    }
    json!({
        "type": "object",
        "required": [TRANSFORMED_PROPERTY_KEY, TRANSFORMED_PROPERTY_VALUE],
        "properties": {
            TRANSFORMED_PROPERTY_KEY: key,
            TRANSFORMED_PROPERTY_VALUE: value,
        },
    })
}

/// The value schema's own keywords with the key prepended to `properties`
/// and `required`.
fn spread_entry(key: Value, mut value: Map<String, Value>) -> Map<String, Value> {
    let mut required = vec![json!(TRANSFORMED_PROPERTY_KEY)];
    if let Some(Value::Array(names)) = value.shift_remove("required") {
        required.extend(
            names
                .into_iter()
                .filter(|name| name.as_str() != Some(TRANSFORMED_PROPERTY_KEY)),
        );
    }
    let mut properties = Map::new();
    properties.insert(TRANSFORMED_PROPERTY_KEY.to_owned(), key);
    if let Some(Value::Object(existing)) = value.shift_remove("properties") {
        properties.extend(existing);
    }
    value.shift_remove("type");

    let mut entry = Map::new();
    entry.insert("type".to_owned(), json!("object"));
    entry.insert("required".to_owned(), Value::Array(required));
    entry.insert("properties".to_owned(), Value::Object(properties));
    entry.extend(value);
    entry
}

fn reshape_node(node: &mut Map<String, Value>, items: Value, path: &SchemaPath) {
    let ty = match node.get("type") {
        Some(Value::Array(types)) => Value::Array(
            types
                .iter()
                .map(|ty| match ty.as_str() {
                    Some("object") => json!("array"),
                    _ => ty.clone(),
                })
                .collect(),
        ),
        _ => json!("array"),
    };
    node.insert("type".to_owned(), ty);

    node.shift_remove("additionalProperties");
    node.shift_remove("patternProperties");
    node.shift_remove("propertyNames");
    for (from, to) in [("minProperties", "minItems"), ("maxProperties", "maxItems")] {
        if let Some(bound) = node.shift_remove(from) {
            node.insert(to.to_owned(), bound);
        }
    }
    if node.shift_remove("properties").is_some() {
        tracing::warn!(%path, "dropping fixed properties of a map-shaped object");
    }
    node.shift_remove("required");
    node.insert("items".to_owned(), items);
}
