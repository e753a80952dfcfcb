use serde_json::{Map, Value};

/// Extract the item list from a GraphQL collection, whichever of the two
/// shapes the API used: `{nodes: [...]}` (flat) or `{edges: [{node: ...}]}`
/// (wrapped). Returns `None` when the value is not a collection.
pub fn collection_items(value: &Value) -> Option<Vec<Value>> {
    let object = value.as_object()?;

    if let Some(nodes) = object.get("nodes").and_then(Value::as_array) {
        return Some(nodes.clone());
    }

    if let Some(edges) = object.get("edges").and_then(Value::as_array) {
        let items = edges
            .iter()
            .filter_map(|edge| edge.get("node"))
            .cloned()
            .collect();
        return Some(items);
    }

    None
}

/// Flatten a resource collection into a uniform list of records.
///
/// Nested sub-collections on each record (variants, images, collections,
/// line items) follow the same dual-shape rule and are flattened the same
/// way, one level deep: each such field is replaced by a plain array.
pub fn normalize_records(collection: &Value) -> Option<Vec<Value>> {
    let items = collection_items(collection)?;
    Some(items.into_iter().map(flatten_nested).collect())
}

fn flatten_nested(record: Value) -> Value {
    let Value::Object(fields) = record else {
        return record;
    };

    let mut flattened = Map::with_capacity(fields.len());
    for (name, value) in fields {
        match collection_items(&value) {
            Some(items) => {
                flattened.insert(name, Value::Array(items));
            }
            None => {
                flattened.insert(name, value);
            }
        }
    }
    Value::Object(flattened)
}
