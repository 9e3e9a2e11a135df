use serde_json::Value;

/// Remove the subtrees addressed by dotted `paths` (`properties.a.items`).
///
/// A leading `.` is accepted and numeric segments index into arrays. Only the
/// last segment is deleted; paths that do not exist are ignored.
pub fn prune_fields<S: AsRef<str>>(mut schema: Value, paths: &[S]) -> Value {
    for path in paths {
        let path = path.as_ref();
        if !remove_path(&mut schema, path) {
            tracing::debug!(path, "field to remove not found");
        }
    }
    schema
}

fn remove_path(schema: &mut Value, path: &str) -> bool {
    let path = path.strip_prefix('.').unwrap_or(path);
    let Some((parents, last)) = path.rsplit_once('.').map_or_else(
        || (!path.is_empty()).then_some(("", path)),
        |(parents, last)| Some((parents, last)),
    ) else {
        return false;
    };

    let mut current = schema;
    for segment in parents.split('.').filter(|segment| !segment.is_empty()) {
        let next = match current {
            Value::Object(map) => map.get_mut(segment),
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get_mut(index)),
            _ => None,
        };
        let Some(next) = next else {
            return false;
        };
        current = next;
    }

    match current {
        Value::Object(map) => map.shift_remove(last).is_some(),
        Value::Array(items) => match last.parse::<usize>() {
            Ok(index) if index < items.len() => {
                items.remove(index);
                true
            }
            _ => false,
        },
        _ => false,
    }
}
