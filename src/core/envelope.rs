//! Uniform response envelope `{status, message, data}` used by every endpoint

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::pagination::PageMeta;

/// Response envelope returned by every backend call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Whether the server reports success
    #[serde(deserialize_with = "deserialize_status", default)]
    pub status: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn ok_with_message(message: &str, data: T) -> Self {
        Self {
            status: true,
            message: Some(message.to_string()),
            data: Some(data),
        }
    }

    pub fn failed(message: &str) -> Self {
        Self {
            status: false,
            message: Some(message.to_string()),
            data: None,
        }
    }

    /// Server message, ignoring blank strings
    pub fn message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

/// `status` arrives as a boolean, an HTTP-like code, or a word
fn deserialize_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_u64() {
            Some(code) => Ok(code == 1 || (200..300).contains(&code)),
            None => Ok(false),
        },
        Value::String(s) => Ok(matches!(
            s.to_lowercase().as_str(),
            "success" | "ok" | "true" | "200"
        )),
        Value::Null => Ok(false),
        other => Err(de::Error::custom(format!("unexpected status: {}", other))),
    }
}

/// `data` of a list response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPage<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub pagination: PageMeta,
}

/// `data` of a permission lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionPayload {
    pub is_create: bool,
    pub is_update: bool,
    pub is_delete: bool,
    pub is_view: Option<bool>,
}
