use serde_json::{Map, Value};

use crate::error::{RefError, RestoreError};
use crate::node::{effective_node, item_schema, member_schema, transformed_items};
use crate::path::pointer_child;
use crate::{TRANSFORMED_PROPERTY_KEY, TRANSFORMED_PROPERTY_VALUE};

/// Map form data for the whole document back to the original value shape.
///
/// `root` is the preprocessed schema the form was rendered from.
///
/// # Errors
///
/// See [`restore_form_value`].
pub fn restore_form_data(value: &Value, root: &Value) -> Result<Value, RestoreError> {
    restore_form_value(value, root, root)
}

/// Turn the arrays of `value` that were generated from maps back into maps.
///
/// Arrays governed by a map-derived schema become objects keyed by
/// `transformedPropertyKey`; each value is `transformedPropertyValue` when
/// present, else the rest of the entry. A later entry wins over an earlier
/// one with the same key. Parts of the value without a governing schema are
/// restored by shape: arrays containing objects with a
/// `transformedPropertyKey` are treated as map entries.
///
/// # Errors
///
/// Fails on entries that are not objects or lack a string key, and on
/// unresolvable `$ref`s. Error paths are JSON pointers into `value`.
pub fn restore_form_value(
    value: &Value,
    schema: &Value,
    root: &Value,
) -> Result<Value, RestoreError> {
    Restorer { root }.restore(value, Some(schema), "")
}

struct Restorer<'a> {
    root: &'a Value,
}

impl Restorer<'_> {
    fn restore(
        &self,
        value: &Value,
        schema: Option<&Value>,
        pointer: &str,
    ) -> Result<Value, RestoreError> {
        let node = match schema {
            Some(schema) => {
                effective_node(schema, self.root).map_err(|source| reference(pointer, source))?
            }
            None => None,
        };
        match node {
            Some(node) => self.restore_node(value, node, pointer),
            None => restore_by_shape(value, pointer),
        }
    }

    fn restore_node(
        &self,
        value: &Value,
        node: &Map<String, Value>,
        pointer: &str,
    ) -> Result<Value, RestoreError> {
        match value {
            Value::Array(items) => {
                let entries = transformed_items(node, self.root)
                    .map_err(|source| reference(pointer, source))?;
                if let Some(entry_node) = entries {
                    return self.restore_entries(items, entry_node, pointer);
                }
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        self.restore(
                            item,
                            item_schema(node, index),
                            &pointer_child(pointer, &index.to_string()),
                        )
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
            Value::Object(members) => members
                .iter()
                .map(|(key, member)| -> Result<(String, Value), RestoreError> {
                    let restored = self.restore(
                        member,
                        member_schema(node, key),
                        &pointer_child(pointer, key),
                    )?;
                    Ok((key.clone(), restored))
                })
                .collect::<Result<Map<_, _>, _>>()
                .map(Value::Object),
            _ => Ok(value.clone()),
        }
    }

    fn restore_entries(
        &self,
        entries: &[Value],
        entry_node: &Map<String, Value>,
        pointer: &str,
    ) -> Result<Value, RestoreError> {
        let mut map = Map::new();
        for (index, entry) in entries.iter().enumerate() {
            let pointer = pointer_child(pointer, &index.to_string());
            let (key, value) = split_entry(entry, &pointer)?;
            let value = match value {
                EntryValue::Wrapped(value) => self.restore(
                    value,
                    member_schema(entry_node, TRANSFORMED_PROPERTY_VALUE),
                    &pointer_child(&pointer, TRANSFORMED_PROPERTY_VALUE),
                )?,
                EntryValue::Spread(rest) => {
                    self.restore_node(&Value::Object(rest), entry_node, &pointer)?
                }
            };
            insert_entry(&mut map, key, value);
        }
        Ok(Value::Object(map))
    }
}

fn reference(pointer: &str, source: RefError) -> RestoreError {
    RestoreError::Reference {
        path: pointer.to_owned(),
        source,
    }
}

enum EntryValue<'v> {
    Wrapped(&'v Value),
    Spread(Map<String, Value>),
}

fn split_entry<'v>(
    entry: &'v Value,
    pointer: &str,
) -> Result<(&'v str, EntryValue<'v>), RestoreError> {
    let Value::Object(members) = entry else {
        return Err(RestoreError::MalformedEntry {
            path: pointer.to_owned(),
        });
    };
    let key = members
        .get(TRANSFORMED_PROPERTY_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| RestoreError::InvalidEntryKey {
            path: pointer.to_owned(),
        })?;
    if let Some(value) = members.get(TRANSFORMED_PROPERTY_VALUE) {
        return Ok((key, EntryValue::Wrapped(value)));
    }
    let rest = members
        .iter()
        .filter(|(name, _)| name.as_str() != TRANSFORMED_PROPERTY_KEY)
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    Ok((key, EntryValue::Spread(rest)))
}

fn insert_entry(map: &mut Map<String, Value>, key: &str, value: Value) {
    if map.insert(key.to_owned(), value).is_some() {
        tracing::debug!(key, "duplicate map entry key, keeping the last value");
    }
}

/// Restore without a schema: arrays holding at least one object with a
/// `transformedPropertyKey` are read as map entries.
fn restore_by_shape(value: &Value, pointer: &str) -> Result<Value, RestoreError> {
    match value {
        Value::Array(items) => {
            let items = items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    restore_by_shape(item, &pointer_child(pointer, &index.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            if !items
                .iter()
                .any(|item| item.get(TRANSFORMED_PROPERTY_KEY).is_some())
            {
                return Ok(Value::Array(items));
            }
            let mut map = Map::new();
            for (index, entry) in items.iter().enumerate() {
                let pointer = pointer_child(pointer, &index.to_string());
                let (key, value) = split_entry(entry, &pointer)?;
                let value = match value {
                    EntryValue::Wrapped(value) => value.clone(),
                    EntryValue::Spread(rest) => Value::Object(rest),
                };
                insert_entry(&mut map, key, value);
            }
            Ok(Value::Object(map))
        }
        Value::Object(members) => members
            .iter()
            .map(|(key, member)| -> Result<(String, Value), RestoreError> {
                Ok((
                    key.clone(),
                    restore_by_shape(member, &pointer_child(pointer, key))?,
                ))
            })
            .collect::<Result<Map<_, _>, _>>()
            .map(Value::Object),
        _ => Ok(value.clone()),
    }
}
