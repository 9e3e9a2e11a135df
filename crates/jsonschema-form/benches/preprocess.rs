#![allow(clippy::unwrap_used)]

use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};

/// A schema with `width` map-shaped properties, each holding `width` entries
/// in its default.
fn wide_schema(width: usize) -> Value {
    let mut properties = serde_json::Map::new();
    for i in 0..width {
        let default: serde_json::Map<String, Value> = (0..width)
            .map(|j| {
                let entry = json!({"size": j, "name": format!("n{j}")});
                (format!("key{j}"), entry)
            })
            .collect();
        properties.insert(
            format!("map{i}"),
            json!({
                "type": "object",
                "additionalProperties": {
                    "type": "object",
                    "properties": {
                        "size": {"type": "integer", "default": 0},
                        "name": {"type": "string"},
                        "labels": {"type": "object", "additionalProperties": {"type": "string"}}
                    }
                },
                "default": default
            }),
        );
    }
    properties.insert(
        "choice".to_string(),
        json!({"anyOf": [{"deprecated": true, "type": "string"}, {"type": "integer"}]}),
    );
    json!({"type": "object", "properties": properties})
}

fn bench_preprocess(c: &mut Criterion) {
    let schema = wide_schema(32);
    c.bench_function("preprocess_schema", |b| {
        b.iter(|| jsonschema_form::preprocess_schema::<&str>(&schema, &[]).unwrap());
    });
}

fn bench_restore(c: &mut Criterion) {
    let schema = wide_schema(32);
    let transformed = jsonschema_form::preprocess_schema::<&str>(&schema, &[]).unwrap();
    let form: serde_json::Map<String, Value> = transformed["properties"]
        .as_object()
        .unwrap()
        .iter()
        .filter_map(|(name, node)| Some((name.clone(), node.get("default")?.clone())))
        .collect();
    let form = Value::Object(form);

    c.bench_function("restore_form_data", |b| {
        b.iter(|| jsonschema_form::restore_form_data(&form, &transformed).unwrap());
    });
}

criterion_group!(benches, bench_preprocess, bench_restore);
criterion_main!(benches);
