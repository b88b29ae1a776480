//! Record trait - common interface for every resource row the engine holds

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::core::form::{FieldValue, FieldValues, FormSchema};

/// Backend identifier of a record
///
/// Backends hand out either numeric or string keys; both are kept as text so
/// they can be placed in a URL path unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build an id from a JSON scalar (string or number)
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        RecordId::from_json(&value)
            .ok_or_else(|| de::Error::custom(format!("invalid record id: {}", value)))
    }
}

/// Common trait for all records shown in a resource table
pub trait Record: Clone + DeserializeOwned {
    /// The record's backend identifier
    fn id(&self) -> &RecordId;

    /// Project the record onto the form schema (used when entering Edit/View)
    fn field_values(&self, schema: &FormSchema) -> FieldValues;

    /// Raw value for a list column, if the record has one
    fn column(&self, key: &str) -> Option<Value>;

    /// Decode one row of a list response
    fn from_row(row: Value, _id_field: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_value(row)
    }
}

/// A schema-free record backed by the JSON object the server returned
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DynamicRecord {
    id: RecordId,
    fields: Map<String, Value>,
}

impl DynamicRecord {
    /// Build a record from a JSON object, reading the id from `id_field`
    pub fn from_object(fields: Map<String, Value>, id_field: &str) -> Option<Self> {
        let id = fields.get(id_field).and_then(RecordId::from_json)?;
        Some(Self { id, fields })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Text form of a field, as displayed in tables and audit messages
    pub fn text(&self, key: &str) -> Option<String> {
        self.fields.get(key).and_then(value_text)
    }
}

impl<'de> Deserialize<'de> for DynamicRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        DynamicRecord::from_object(fields, "id")
            .ok_or_else(|| de::Error::custom("record has no usable 'id' field"))
    }
}

impl Record for DynamicRecord {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn field_values(&self, schema: &FormSchema) -> FieldValues {
        let mut values = FieldValues::default();
        for field in schema.fields() {
            let value = self
                .fields
                .get(&field.name)
                .map(|raw| FieldValue::from_json(&field.kind, raw))
                .unwrap_or(FieldValue::Empty);
            values.set(&field.name, value);
        }
        values
    }

    fn column(&self, key: &str) -> Option<Value> {
        self.fields.get(key).cloned()
    }

    fn from_row(row: Value, id_field: &str) -> Result<Self, serde_json::Error> {
        let fields = match row {
            Value::Object(fields) => fields,
            other => {
                return Err(de::Error::custom(format!("expected a JSON object, got {}", other)))
            }
        };
        DynamicRecord::from_object(fields, id_field)
            .ok_or_else(|| de::Error::custom(format!("record has no usable '{}' field", id_field)))
    }
}

/// Render a JSON scalar as display text (`null` → None)
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}
