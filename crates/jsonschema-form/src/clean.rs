use serde_json::{Map, Value};

use crate::error::RefError;
use crate::node::{effective_node, item_schema, member_schema};
use crate::{TRANSFORMED_PROPERTY_KEY, TRANSFORMED_PROPERTY_VALUE};

/// What [`clean_payload`] strips from a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct CleanOptions {
    pub empty_arrays: bool,
    pub empty_objects: bool,
    pub empty_strings: bool,
    pub null_values: bool,
    /// Drop members equal to their effective default.
    pub clean_default_values: bool,
    /// Drop object members and array items that no subschema governs.
    pub unknown_members: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            empty_arrays: true,
            empty_objects: true,
            empty_strings: true,
            null_values: true,
            clean_default_values: false,
            unknown_members: false,
        }
    }
}

/// Deep-clean `value` guided by `schema`.
///
/// Members of objects and arrays are dropped when they are empty (per
/// `options`) or, with [`CleanOptions::clean_default_values`], when they equal
/// their effective default: the default handed down by the parent's default,
/// else the member schema's `default`, else `""`, `false`, `[]` or `{}` by
/// value kind. The map entry key is never dropped for matching a default.
/// Members without a governing schema are kept as they are, unless
/// [`CleanOptions::unknown_members`] is set.
///
/// # Errors
///
/// Returns a [`RefError`] when a `$ref` on the way cannot be resolved.
pub fn clean_payload(
    value: &Value,
    schema: &Value,
    root: &Value,
    options: &CleanOptions,
) -> Result<Value, RefError> {
    match effective_node(schema, root)? {
        Some(node) => clean_node_value(value, node, root, options),
        None => Ok(value.clone()),
    }
}

pub(crate) fn clean_node_value(
    value: &Value,
    node: &Map<String, Value>,
    root: &Value,
    options: &CleanOptions,
) -> Result<Value, RefError> {
    Cleaner { root, options }.container(value, node, None)
}

struct Cleaner<'a> {
    root: &'a Value,
    options: &'a CleanOptions,
}

impl Cleaner<'_> {
    /// Clean the members of an object or array; other values are returned
    /// unchanged.
    fn container(
        &self,
        value: &Value,
        node: &Map<String, Value>,
        defaults: Option<&Value>,
    ) -> Result<Value, RefError> {
        match value {
            Value::Object(members) => {
                let mut cleaned = Map::new();
                for (key, member) in members {
                    let Some(schema) = member_schema(node, key) else {
                        if !self.options.unknown_members {
                            cleaned.insert(key.clone(), member.clone());
                        }
                        continue;
                    };
                    let inherited = defaults.and_then(|defaults| defaults.get(key));
                    let reserved =
                        key == TRANSFORMED_PROPERTY_KEY || key == TRANSFORMED_PROPERTY_VALUE;
                    if let Some(member) = self.member(member, schema, inherited, reserved)? {
                        cleaned.insert(key.clone(), member);
                    }
                }
                Ok(Value::Object(cleaned))
            }
            Value::Array(items) => {
                let mut cleaned = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let Some(schema) = item_schema(node, index) else {
                        if !self.options.unknown_members {
                            cleaned.push(item.clone());
                        }
                        continue;
                    };
                    let inherited = defaults.and_then(|defaults| default_entry(defaults, item));
                    if let Some(item) = self.member(item, schema, inherited, false)? {
                        cleaned.push(item);
                    }
                }
                Ok(Value::Array(cleaned))
            }
            _ => Ok(value.clone()),
        }
    }

    /// Cleaned member, or `None` when it should be dropped.
    fn member(
        &self,
        value: &Value,
        schema: &Value,
        inherited: Option<&Value>,
        reserved: bool,
    ) -> Result<Option<Value>, RefError> {
        let Some(node) = effective_node(schema, self.root)? else {
            return Ok(Some(value.clone()));
        };
        let implicit = implicit_default(value);
        let default = inherited
            .filter(|default| !default.is_null())
            .or_else(|| schema.get("default").filter(|default| !default.is_null()))
            .or_else(|| node.get("default").filter(|default| !default.is_null()))
            .or(implicit.as_ref());
        let equals_default = |cleaned: &Value| {
            self.options.clean_default_values
                && !reserved
                && default.is_some_and(|default| value == default || cleaned == default)
        };

        let keep = match value {
            Value::Array(items) => {
                let inner = default.filter(|default| shares_entry_keys(items, default));
                let cleaned = self.container(value, node, inner)?;
                let empty = self.options.empty_arrays && is_empty(&cleaned);
                (!equals_default(&cleaned) && !empty).then_some(cleaned)
            }
            Value::Object(_) => {
                let cleaned = self.container(value, node, default)?;
                let empty = self.options.empty_objects && is_empty(&cleaned);
                (!equals_default(&cleaned) && !empty).then_some(cleaned)
            }
            Value::Null => {
                let keep = !self.options.null_values && !equals_default(value);
                keep.then(Value::default)
            }
            Value::String(text) if text.is_empty() && self.options.empty_strings => None,
            scalar => (!equals_default(scalar)).then(|| scalar.clone()),
        };
        Ok(keep)
    }
}

fn implicit_default(value: &Value) -> Option<Value> {
    match value {
        Value::String(_) => Some(Value::String(String::new())),
        Value::Bool(_) => Some(Value::Bool(false)),
        Value::Array(_) => Some(Value::Array(Vec::new())),
        Value::Object(_) => Some(Value::Object(Map::new())),
        Value::Null | Value::Number(_) => None,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.is_empty(),
        Value::Object(members) => members.is_empty(),
        _ => false,
    }
}

fn entry_key(entry: &Value) -> Option<&str> {
    entry.get(TRANSFORMED_PROPERTY_KEY)?.as_str()
}

/// Whether `items` holds map entries with exactly the keys of the entries in
/// `default`, so defaults can be compared entry by entry.
fn shares_entry_keys(items: &[Value], default: &Value) -> bool {
    let Some(defaults) = default.as_array() else {
        return false;
    };
    if !items
        .iter()
        .any(|item| item.get(TRANSFORMED_PROPERTY_KEY).is_some())
    {
        return false;
    }
    let mut keys: Vec<_> = items.iter().map(entry_key).collect();
    let mut default_keys: Vec<_> = defaults.iter().map(entry_key).collect();
    keys.sort_unstable();
    default_keys.sort_unstable();
    keys == default_keys
}

/// The entry of a map-derived default with the same key as `item`.
fn default_entry<'d>(defaults: &'d Value, item: &Value) -> Option<&'d Value> {
    let key = entry_key(item)?;
    defaults
        .as_array()?
        .iter()
        .find(|entry| entry_key(entry) == Some(key))
}
