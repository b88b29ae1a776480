//! Typed records for built-in resources
//!
//! Screens can work on [`DynamicRecord`](crate::core::DynamicRecord) rows
//! alone; these types exist for callers that want compile-time field access.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::form::{FieldValue, FieldValues, FormSchema};
use crate::core::record::{Record, RecordId};

/// Unit of measure (`unit-of-measure`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitOfMeasure {
    pub id: RecordId,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub factor: Option<f64>,
}

impl Record for UnitOfMeasure {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn field_values(&self, schema: &FormSchema) -> FieldValues {
        let mut values = FieldValues::default();
        for field in schema.fields() {
            let value = match field.name.as_str() {
                "code" => FieldValue::Text(self.code.clone()),
                "name" => FieldValue::Text(self.name.clone()),
                "factor" => self.factor.map(FieldValue::Decimal).unwrap_or_default(),
                _ => FieldValue::Empty,
            };
            values.set(&field.name, value);
        }
        values
    }

    fn column(&self, key: &str) -> Option<Value> {
        match key {
            "id" => Some(Value::String(self.id.to_string())),
            "code" => Some(Value::String(self.code.clone())),
            "name" => Some(Value::String(self.name.clone())),
            "factor" => self.factor.map(Value::from),
            _ => None,
        }
    }
}

/// Application role (`role`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: RecordId,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Record for Role {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn field_values(&self, schema: &FormSchema) -> FieldValues {
        let mut values = FieldValues::default();
        for field in schema.fields() {
            let value = match field.name.as_str() {
                "code" => FieldValue::Text(self.code.clone()),
                "name" => FieldValue::Text(self.name.clone()),
                "description" => self
                    .description
                    .clone()
                    .map(FieldValue::Text)
                    .unwrap_or_default(),
                _ => FieldValue::Empty,
            };
            values.set(&field.name, value);
        }
        values
    }

    fn column(&self, key: &str) -> Option<Value> {
        match key {
            "id" => Some(Value::String(self.id.to_string())),
            "code" => Some(Value::String(self.code.clone())),
            "name" => Some(Value::String(self.name.clone())),
            "description" => self.description.clone().map(Value::String),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::Catalog;
    use serde_json::json;

    #[test]
    fn test_unit_decodes_numeric_id() {
        let unit = UnitOfMeasure::from_row(
            json!({"id": 7, "code": "KG", "name": "Kilogram", "factor": 1000}),
            "id",
        )
        .unwrap();
        assert_eq!(unit.id, RecordId::new("7"));
        assert_eq!(unit.factor, Some(1000.0));
    }

    #[test]
    fn test_unit_projects_onto_catalog_schema() {
        let schema = Catalog::builtin().unwrap().get("units").unwrap().schema();
        let unit = UnitOfMeasure {
            id: RecordId::new("1"),
            code: "M".to_string(),
            name: "Metre".to_string(),
            factor: None,
        };
        let values = unit.field_values(&schema);
        assert_eq!(values.text("code").as_deref(), Some("M"));
        assert_eq!(values.get("factor"), Some(&FieldValue::Empty));
    }

    #[test]
    fn test_role_columns() {
        let role = Role {
            id: RecordId::new("r1"),
            code: "ADM".to_string(),
            name: "Administrator".to_string(),
            description: None,
        };
        assert_eq!(role.column("code"), Some(json!("ADM")));
        assert_eq!(role.column("description"), None);
    }
}
