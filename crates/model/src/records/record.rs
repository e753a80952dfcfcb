use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A normalized source record: one product, customer, or order as returned by
/// the source API, with all collection wrappers already flattened away.
///
/// Records stay schemaless JSON; field mapping into target entities happens in
/// the external upsert collaborator, not here.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Record(pub Value);

impl Record {
    pub fn new(value: Value) -> Self {
        Record(value)
    }

    /// Stable external identifier (`id` field), the upsert key.
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn i64_field(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Value::as_i64)
    }

    /// Tags, whether the source sent them as an array or a comma-joined string.
    pub fn tags(&self) -> Vec<String> {
        match self.0.get("tags") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(joined)) => joined
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Variant prices, parsed leniently (the API returns money as strings).
    pub fn variant_prices(&self) -> Vec<f64> {
        let Some(variants) = self.0.get("variants").and_then(Value::as_array) else {
            return Vec::new();
        };
        variants
            .iter()
            .filter_map(|v| v.get("price"))
            .filter_map(|p| match p {
                Value::String(s) => s.parse::<f64>().ok(),
                Value::Number(n) => n.as_f64(),
                _ => None,
            })
            .collect()
    }

    /// Aggregate inventory across the record, if the source exposed it.
    pub fn total_inventory(&self) -> Option<i64> {
        self.i64_field("totalInventory")
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Record(value)
    }
}
