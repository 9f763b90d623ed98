use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record as returned by the listing endpoints. Only `id` and `updateable`
/// are interpreted; everything else is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListedRecord {
    pub id: i64,
    #[serde(default)]
    pub updateable: bool,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ListedRecord {
    pub fn new(id: i64, updateable: bool) -> Self { Self { id, updateable, fields: Map::new() } }

    /// Builder used by fixtures: point `field` at another record.
    pub fn with_ref(mut self, field: &str, target_id: i64) -> Self {
        self.fields.insert(field.to_string(), serde_json::json!({"id": target_id}));
        self
    }

    pub fn with_field(mut self, field: &str, value: Value) -> Self {
        self.fields.insert(field.to_string(), value);
        self
    }

    /// Id of the record referenced through `field`. Accepts a nested object
    /// (`{"coordinates": {"id": 5}}`) or a bare id; `null` or absent means no reference.
    pub fn reference_id(&self, field: &str) -> Option<i64> {
        match self.fields.get(field)? {
            Value::Object(obj) => obj.get("id").and_then(Value::as_i64),
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
