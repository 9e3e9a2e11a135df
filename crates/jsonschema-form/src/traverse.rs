use core::convert::Infallible;

use serde_json::{Map, Value};

use crate::path::{Keyword, SchemaPath};

/// Walk every subschema of `schema` post-order, root last.
///
/// Children are visited in a fixed order: `$defs` entries, `properties`
/// entries, `items` (single schema), `items` (array form), `anyOf`, `allOf`,
/// `oneOf`, `additionalProperties`, then `patternProperties` entries.
/// Boolean subschemas are skipped and `$ref`s are not followed.
///
/// The first error returned by `visitor` stops the walk.
pub fn try_traverse_mut<E, F>(schema: &mut Value, visitor: &mut F) -> Result<(), E>
where
    F: FnMut(&mut Map<String, Value>, &SchemaPath) -> Result<(), E>,
{
    walk(schema, &SchemaPath::root(), visitor)
}

/// Infallible form of [`try_traverse_mut`].
pub fn traverse_mut<F>(schema: &mut Value, mut visitor: F)
where
    F: FnMut(&mut Map<String, Value>, &SchemaPath),
{
    let Ok(()) = try_traverse_mut::<Infallible, _>(schema, &mut |node, path| {
        visitor(node, path);
        Ok(())
    });
}

/// Consume `schema`, apply `visitor` to every node and return the result.
pub fn traverse<F>(mut schema: Value, visitor: F) -> Value
where
    F: FnMut(&mut Map<String, Value>, &SchemaPath),
{
    traverse_mut(&mut schema, visitor);
    schema
}

fn walk<E, F>(schema: &mut Value, path: &SchemaPath, visitor: &mut F) -> Result<(), E>
where
    F: FnMut(&mut Map<String, Value>, &SchemaPath) -> Result<(), E>,
{
    let Value::Object(node) = schema else {
        return Ok(());
    };

    walk_entries(node, Keyword::Defs, path, visitor)?;
    walk_entries(node, Keyword::Properties, path, visitor)?;
    if let Some(items) = node.get_mut(Keyword::Items.as_str())
        && items.is_object()
    {
        walk(items, &path.keyword(Keyword::Items), visitor)?;
    }
    walk_indexed(node, Keyword::Items, path, visitor)?;
    walk_indexed(node, Keyword::AnyOf, path, visitor)?;
    walk_indexed(node, Keyword::AllOf, path, visitor)?;
    walk_indexed(node, Keyword::OneOf, path, visitor)?;
    if let Some(additional) = node.get_mut(Keyword::AdditionalProperties.as_str()) {
        walk(
            additional,
            &path.keyword(Keyword::AdditionalProperties),
            visitor,
        )?;
    }
    walk_entries(node, Keyword::PatternProperties, path, visitor)?;

    visitor(node, path)
}

/// Walk the values of a name→schema keyword.
fn walk_entries<E, F>(
    node: &mut Map<String, Value>,
    keyword: Keyword,
    path: &SchemaPath,
    visitor: &mut F,
) -> Result<(), E>
where
    F: FnMut(&mut Map<String, Value>, &SchemaPath) -> Result<(), E>,
{
    let Some(Value::Object(entries)) = node.get_mut(keyword.as_str()) else {
        return Ok(());
    };
    for (name, child) in entries.iter_mut() {
        walk(child, &path.key(keyword, name), visitor)?;
    }
    Ok(())
}

/// Walk the elements of a schema-list keyword.
fn walk_indexed<E, F>(
    node: &mut Map<String, Value>,
    keyword: Keyword,
    path: &SchemaPath,
    visitor: &mut F,
) -> Result<(), E>
where
    F: FnMut(&mut Map<String, Value>, &SchemaPath) -> Result<(), E>,
{
    let Some(Value::Array(children)) = node.get_mut(keyword.as_str()) else {
        return Ok(());
    };
    for (index, child) in children.iter_mut().enumerate() {
        walk(child, &path.index(keyword, index), visitor)?;
    }
    Ok(())
}
