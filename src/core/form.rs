//! Form schema, typed field values and modal form state

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::core::record::RecordId;

/// Value kind of a form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Integer,
    Decimal,
    Boolean,
    /// Identifier of a record in another resource (picked via a dependent picker)
    Reference,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::Integer => write!(f, "integer"),
            FieldKind::Decimal => write!(f, "decimal"),
            FieldKind::Boolean => write!(f, "boolean"),
            FieldKind::Reference => write!(f, "reference"),
        }
    }
}

/// A typed field value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    #[default]
    Empty,
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Reference(RecordId),
}

impl FieldValue {
    /// Interpret a JSON value from the server according to the field kind
    ///
    /// Values that do not fit the kind are kept as text rather than dropped.
    pub fn from_json(kind: &FieldKind, raw: &Value) -> Self {
        if raw.is_null() {
            return FieldValue::Empty;
        }
        let fallback = || match raw {
            Value::String(s) if s.is_empty() => FieldValue::Empty,
            Value::String(s) => FieldValue::Text(s.clone()),
            other => FieldValue::Text(other.to_string()),
        };
        match kind {
            FieldKind::Text => fallback(),
            FieldKind::Integer => match raw {
                Value::Number(n) => n.as_i64().map(FieldValue::Integer).unwrap_or_else(fallback),
                Value::String(s) => s
                    .trim()
                    .parse()
                    .map(FieldValue::Integer)
                    .unwrap_or_else(|_| fallback()),
                _ => fallback(),
            },
            FieldKind::Decimal => match raw {
                Value::Number(n) => n.as_f64().map(FieldValue::Decimal).unwrap_or_else(fallback),
                Value::String(s) => s
                    .trim()
                    .parse()
                    .map(FieldValue::Decimal)
                    .unwrap_or_else(|_| fallback()),
                _ => fallback(),
            },
            FieldKind::Boolean => match raw {
                Value::Bool(b) => FieldValue::Boolean(*b),
                Value::Number(n) => FieldValue::Boolean(n.as_i64() != Some(0)),
                Value::String(s) => parse_bool(s).map(FieldValue::Boolean).unwrap_or_else(fallback),
                _ => fallback(),
            },
            FieldKind::Reference => RecordId::from_json(raw)
                .map(FieldValue::Reference)
                .unwrap_or(FieldValue::Empty),
        }
    }

    /// Parse user input for a field of the given kind
    pub fn parse(kind: &FieldKind, input: &str) -> Result<Self, String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(FieldValue::Empty);
        }
        match kind {
            FieldKind::Text => Ok(FieldValue::Text(input.to_string())),
            FieldKind::Integer => trimmed
                .parse()
                .map(FieldValue::Integer)
                .map_err(|_| format!("'{}' is not a whole number", trimmed)),
            FieldKind::Decimal => trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(FieldValue::Decimal)
                .ok_or_else(|| format!("'{}' is not a number", trimmed)),
            FieldKind::Boolean => parse_bool(trimmed)
                .map(FieldValue::Boolean)
                .ok_or_else(|| format!("'{}' is not yes/no", trimmed)),
            FieldKind::Reference => Ok(FieldValue::Reference(RecordId::new(trimmed))),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// JSON form sent to the server
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Empty => Value::Null,
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Integer(n) => Value::Number((*n).into()),
            FieldValue::Decimal(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Reference(id) => Value::String(id.to_string()),
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(n) => Some(*n as f64),
            FieldValue::Decimal(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Empty => Ok(()),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Decimal(v) => write!(f, "{}", v),
            FieldValue::Boolean(b) => write!(f, "{}", if *b { "yes" } else { "no" }),
            FieldValue::Reference(id) => write!(f, "{}", id),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Some(true),
        "false" | "no" | "n" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Field values of one form, keyed by field name
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldValues(BTreeMap<String, FieldValue>);

impl FieldValues {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn set(&mut self, name: &str, value: FieldValue) {
        self.0.insert(name.to_string(), value);
    }

    /// Display text of a field (None when missing or empty)
    pub fn text(&self, name: &str) -> Option<String> {
        self.0
            .get(name)
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Field errors of one form, keyed by field name
pub type FieldErrors = BTreeMap<String, String>;

/// Declarative field validator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Validator {
    MinLength { min: usize },
    MaxLength { max: usize },
    Range {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    OneOf { values: Vec<String> },
}

impl Validator {
    /// Check a non-empty value; returns the error message on failure
    pub fn check(&self, label: &str, value: &FieldValue) -> Option<String> {
        match self {
            Validator::MinLength { min } => {
                let len = value.to_string().chars().count();
                (len < *min).then(|| format!("{} must be at least {} characters", label, min))
            }
            Validator::MaxLength { max } => {
                let len = value.to_string().chars().count();
                (len > *max).then(|| format!("{} must be at most {} characters", label, max))
            }
            Validator::Range { min, max } => {
                let Some(n) = value.as_number() else {
                    return Some(format!("{} must be a number", label));
                };
                if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) {
                    let bounds = match (min, max) {
                        (Some(lo), Some(hi)) => format!("between {} and {}", lo, hi),
                        (Some(lo), None) => format!("at least {}", lo),
                        (None, Some(hi)) => format!("at most {}", hi),
                        (None, None) => unreachable!("range without bounds cannot fail"),
                    };
                    return Some(format!("{} must be {}", label, bounds));
                }
                None
            }
            Validator::OneOf { values } => {
                let text = value.to_string();
                (!values.iter().any(|v| v == &text))
                    .then(|| format!("{} must be one of: {}", label, values.join(", ")))
            }
        }
    }
}

/// Description of one form field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    /// Resource key a reference field picks from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,
}

impl FieldSchema {
    pub fn new(name: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            required: false,
            references: None,
            validators: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn references(mut self, resource: &str) -> Self {
        self.kind = FieldKind::Reference;
        self.references = Some(resource.to_string());
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Run the required check and the declarative validators
    pub fn validate(&self, value: &FieldValue) -> Option<String> {
        if value.is_empty() {
            return self
                .required
                .then(|| format!("{} is required", self.label));
        }
        self.validators
            .iter()
            .find_map(|v| v.check(&self.label, value))
    }
}

type CheckFn = dyn Fn(&FieldValues) -> Option<String>;

/// A programmatic check attached to one field, evaluated against all values
#[derive(Clone)]
struct CustomCheck {
    field: String,
    check: Rc<CheckFn>,
}

/// Field schema of a resource form
#[derive(Clone, Serialize, Deserialize)]
pub struct FormSchema {
    /// Field whose value identifies the record to humans (used in audit messages)
    pub code_field: String,
    #[serde(default)]
    fields: Vec<FieldSchema>,
    #[serde(skip)]
    checks: Vec<CustomCheck>,
}

impl fmt::Debug for FormSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormSchema")
            .field("code_field", &self.code_field)
            .field("fields", &self.fields)
            .field("checks", &self.checks.len())
            .finish()
    }
}

impl FormSchema {
    pub fn new(code_field: &str) -> Self {
        Self {
            code_field: code_field.to_string(),
            fields: Vec::new(),
            checks: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Attach a custom check to a field; it only runs when the field passed
    /// its declarative validators
    pub fn check<F>(mut self, field: &str, check: F) -> Self
    where
        F: Fn(&FieldValues) -> Option<String> + 'static,
    {
        self.checks.push(CustomCheck {
            field: field.to_string(),
            check: Rc::new(check),
        });
        self
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn find(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Values for an empty Add form
    pub fn blank_values(&self) -> FieldValues {
        let mut values = FieldValues::default();
        for field in &self.fields {
            values.set(&field.name, FieldValue::Empty);
        }
        values
    }

    /// Validate all fields; an empty map means the form may be submitted
    pub fn validate(&self, values: &FieldValues) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for field in &self.fields {
            let value = values.get(&field.name).cloned().unwrap_or_default();
            if let Some(err) = field.validate(&value) {
                errors.insert(field.name.clone(), err);
            }
        }
        for custom in &self.checks {
            if errors.contains_key(&custom.field) {
                continue;
            }
            if let Some(err) = (custom.check)(values) {
                errors.insert(custom.field.clone(), err);
            }
        }
        errors
    }

    /// Request body for create/update: every schema field, nothing else
    pub fn payload(&self, values: &FieldValues) -> Value {
        let mut body = Map::new();
        for field in &self.fields {
            let value = values
                .get(&field.name)
                .map(FieldValue::to_json)
                .unwrap_or(Value::Null);
            body.insert(field.name.clone(), value);
        }
        Value::Object(body)
    }
}

/// Mode of the workflow modal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Idle,
    Add,
    Edit,
    Delete,
    View,
}

impl FormMode {
    /// Fields accept input only while adding or editing
    pub fn is_editable(&self) -> bool {
        matches!(self, FormMode::Add | FormMode::Edit)
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, FormMode::Idle)
    }
}

impl fmt::Display for FormMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormMode::Idle => write!(f, "idle"),
            FormMode::Add => write!(f, "add"),
            FormMode::Edit => write!(f, "edit"),
            FormMode::Delete => write!(f, "delete"),
            FormMode::View => write!(f, "view"),
        }
    }
}

/// State of the workflow modal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub mode: FormMode,
    pub title: String,
    pub values: FieldValues,
    pub errors: FieldErrors,
    /// Fields whose last input could not be parsed; the previous value is
    /// still in `values`, so these block submission until re-entered
    pub rejected: FieldErrors,
}

impl FormState {
    pub fn is_editable(&self) -> bool {
        self.mode.is_editable()
    }

    /// Back to Idle with no values or errors
    pub fn reset(&mut self) {
        *self = FormState::default();
    }
}
