use serde_json::{Map, Value, json};

use jsonschema_form::{PreprocessError, preprocess_schema};

/// The fixture schema reduced to `$schema`, `type` and the given paths.
fn test_schema(fields: &[&str]) -> Value {
    let full: Value =
        serde_json::from_str(include_str!("fixtures/test-schema.json")).expect("valid JSON");
    if fields.is_empty() {
        return full;
    }
    let mut picked = json!({"$schema": full["$schema"], "type": full["type"]});
    for field in fields {
        let pointer = format!("/{}", field.replace('.', "/"));
        let value = full.pointer(&pointer).expect("field exists").clone();
        insert_at(&mut picked, field, value);
    }
    picked
}

fn insert_at(target: &mut Value, path: &str, value: Value) {
    let mut current = target;
    let segments: Vec<_> = path.split('.').collect();
    let (last, parents) = segments.split_last().expect("non-empty path");
    for segment in parents {
        current = current
            .as_object_mut()
            .expect("object")
            .entry(*segment)
            .or_insert_with(|| Value::Object(Map::new()));
    }
    current
        .as_object_mut()
        .expect("object")
        .insert((*last).to_string(), value);
}

fn preprocess(schema: &Value, remove: &[&str]) -> Value {
    preprocess_schema(schema, remove).expect("preprocessable")
}

#[test]
fn removes_fields_at_the_root_level() {
    let schema = test_schema(&[
        "properties.arrayFields",
        "properties.booleanFields",
        "properties.logic",
    ]);
    assert_eq!(
        preprocess(&schema, &["properties.arrayFields", "properties.logic"]),
        json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "properties": {
                "booleanFields": {
                    "properties": {
                        "active": {"type": "boolean"},
                        "enabled": {
                            "description": "Boolean field with title and description.",
                            "title": "Enabled",
                            "type": "boolean"
                        }
                    },
                    "title": "Boolean fields",
                    "type": "object"
                }
            },
            "type": "object"
        })
    );
}

#[test]
fn removes_nested_fields() {
    let schema = test_schema(&[
        "properties.arrayFields",
        "properties.booleanFields",
        "properties.logic",
    ]);
    let out = preprocess(
        &schema,
        &[
            "properties.arrayFields",
            "properties.logic",
            "properties.booleanFields.properties.active",
        ],
    );
    assert_eq!(
        out["properties"]["booleanFields"]["properties"],
        json!({
            "enabled": {
                "description": "Boolean field with title and description.",
                "title": "Enabled",
                "type": "boolean"
            }
        })
    );
    assert!(out["properties"].get("arrayFields").is_none());
}

#[test]
fn removes_nested_fields_of_items() {
    let schema = test_schema(&[
        "properties.arrayFields",
        "properties.booleanFields",
        "properties.logic",
    ]);
    let out = preprocess(
        &schema,
        &[
            "properties.logic",
            "properties.booleanFields",
            "properties.arrayFields.properties.arrayOfObjects.items.properties.age",
        ],
    );
    assert_eq!(
        out,
        json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "properties": {
                "arrayFields": {
                    "properties": {
                        "arrayOfObjects": {
                            "items": {
                                "properties": {"name": {"type": "string"}},
                                "type": "object"
                            },
                            "title": "Array of objects",
                            "type": "array"
                        }
                    },
                    "title": "Array fields",
                    "type": "object"
                }
            },
            "type": "object"
        })
    );
}

#[test]
fn uses_the_first_non_deprecated_subschema_for_any_of() {
    let out = preprocess(&test_schema(&["properties.logic"]), &[]);
    assert_eq!(
        out["properties"]["logic"]["properties"]["anyOf"]["properties"],
        json!({
            "anyOfDeprecated": {
                "description": "Only the second declared subschema (number, minimum=3) should be visible.",
                "minimum": 3,
                "title": "Property with subschemas using 'anyOf' and 'deprecated'",
                "type": "number"
            },
            "anyOfSimple": {
                "description": "Only the first declared subschema (string, minLength=3) should be visible.",
                "minLength": 3,
                "title": "Property with two subschemas using 'anyOf'",
                "type": "string"
            }
        })
    );
}

fn string_entries(pattern: Option<&str>) -> Value {
    let mut key = json!({"type": "string", "title": "Key"});
    if let Some(pattern) = pattern {
        key["pattern"] = json!(pattern);
    }
    json!({
        "type": "object",
        "required": ["transformedPropertyKey", "transformedPropertyValue"],
        "properties": {
            "transformedPropertyKey": key,
            "transformedPropertyValue": {"type": "string", "title": "Value"}
        }
    })
}

fn object_entries(pattern: Option<&str>, properties: Value) -> Value {
    let mut key = json!({"type": "string", "title": "Key"});
    if let Some(pattern) = pattern {
        key["pattern"] = json!(pattern);
    }
    let mut all = json!({"transformedPropertyKey": key});
    all.as_object_mut()
        .expect("object")
        .extend(properties.as_object().expect("object").clone());
    json!({
        "type": "object",
        "required": ["transformedPropertyKey"],
        "properties": all
    })
}

fn expected_map_fields(pattern: Option<&str>) -> Value {
    json!({
        "objectOfStrings": {"type": "array", "items": string_entries(pattern)},
        "objectOfObjects": {
            "type": "array",
            "items": object_entries(pattern, json!({"age": {"type": "number"}, "name": {"type": "string"}}))
        },
        "objectOfStringsWithDefault": {
            "type": "array",
            "default": [
                {"transformedPropertyKey": "label/name", "transformedPropertyValue": "abcde"},
                {"transformedPropertyKey": "label/priority", "transformedPropertyValue": "high"}
            ],
            "items": string_entries(pattern)
        },
        "objectOfObjectsWithDefault": {
            "type": "array",
            "default": [
                {"transformedPropertyKey": "abcde", "instanceType": "m5.xlarge", "minSize": 4}
            ],
            "items": object_entries(
                pattern,
                json!({"instanceType": {"type": "string"}, "minSize": {"type": "number"}})
            )
        }
    })
}

#[test]
fn transforms_additional_properties_into_arrays() {
    let out = preprocess(
        &test_schema(&["properties.objectsWithAdditionalProperties"]),
        &[],
    );
    assert_eq!(
        out,
        json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "properties": {
                "objectsWithAdditionalProperties": {
                    "type": "object",
                    "properties": expected_map_fields(None)
                }
            },
            "type": "object"
        })
    );
}

#[test]
fn transforms_pattern_properties_into_arrays() {
    let out = preprocess(
        &test_schema(&["properties.objectsWithPatternProperties"]),
        &[],
    );
    assert_eq!(
        out["properties"]["objectsWithPatternProperties"]["properties"],
        expected_map_fields(Some("^[a-z]{5,10}$"))
    );
}

#[test]
fn looks_for_default_values_in_properties_internal() {
    let out = preprocess(
        &test_schema(&[
            "properties.objectsWithDefaultsInInternals",
            "properties.internal",
        ]),
        &[],
    );
    assert_eq!(
        out,
        json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "properties": {
                "objectsWithDefaultsInInternals": {
                    "type": "object",
                    "properties": {
                        "objectOfStrings": {
                            "type": "array",
                            "default": [
                                {"transformedPropertyKey": "label/name", "transformedPropertyValue": "abcde"},
                                {"transformedPropertyKey": "label/priority", "transformedPropertyValue": "high"}
                            ],
                            "items": string_entries(None)
                        },
                        "objectOfObjects": {
                            "type": "array",
                            "default": [
                                {"transformedPropertyKey": "abcde", "instanceType": "m5.xlarge", "minSize": 4}
                            ],
                            "items": object_entries(
                                Some("^[a-z]{5,10}$"),
                                json!({"instanceType": {"type": "string"}, "minSize": {"type": "number"}})
                            )
                        }
                    }
                }
            },
            "type": "object"
        })
    );
}

#[test]
fn removed_paths_stay_removed() {
    let schema = test_schema(&[]);
    let remove = [
        "properties.numericFields.properties.integerField",
        "properties.logic",
        "properties.objectsWithAdditionalProperties.properties.objectOfStrings",
    ];
    let out = preprocess(&schema, &remove);
    for path in remove {
        let pointer = format!("/{}", path.replace('.', "/"));
        assert!(out.pointer(&pointer).is_none(), "{path} is still present");
    }
}

#[test]
fn preprocessing_is_idempotent() {
    let once = preprocess(&test_schema(&[]), &[]);
    let twice = preprocess(&once, &[]);
    assert_eq!(once, twice);
}

#[test]
fn every_deprecated_branch_is_reported() {
    let schema = json!({
        "type": "object",
        "properties": {
            "legacy": {
                "anyOf": [
                    {"deprecated": true, "type": "string"},
                    {"deprecated": true, "type": "number"}
                ]
            }
        }
    });
    let err = preprocess_schema::<&str>(&schema, &[]).expect_err("unrenderable field");
    assert!(matches!(err, PreprocessError::AllBranchesDeprecated { .. }));
    insta::assert_snapshot!(err.to_string(), @"every branch of `anyOf` at `properties.legacy` is deprecated");
}
