//! Resource catalog: which tables exist and how each one is shaped
//!
//! The catalog is plain YAML (`.mdesk/resources.yaml`). Each entry becomes a
//! [`ResourceDescriptor`] from which the engine components of one screen are
//! built.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::filter::FilterState;
use crate::core::form::{FieldSchema, FormSchema};
use crate::core::permission::PermissionScope;
use crate::yaml::YamlSyntaxError;

fn default_id_field() -> String {
    "id".to_string()
}

fn default_label_field() -> String {
    "name".to_string()
}

/// One list column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub key: String,
    pub title: String,
    /// Maximum display width before truncation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,
}

/// A structural filter of the list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Query parameter name
    pub key: String,
    pub label: String,
    /// Filter this one depends on; changing the parent clears it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// Option source for a reference field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickerSpec {
    /// Form field (and filter key) the picker fills
    pub field: String,
    /// Catalog key of the foreign resource
    pub resource: String,
    /// Foreign column shown to the user
    #[serde(default = "default_label_field")]
    pub label_field: String,
    /// Field whose value scopes the options; sent as a filter of the same name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// Everything needed to build one resource screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Catalog key used on the command line
    pub key: String,
    /// Endpoint path relative to the API base URL
    pub path: String,
    /// Route the permission service knows this screen by
    pub route: String,
    /// Singular display name ("Unit of Measure")
    pub label: String,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    /// Human-facing identifier used in audit messages
    pub code_field: String,
    #[serde(default = "default_label_field")]
    pub label_field: String,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    #[serde(default)]
    pub pickers: Vec<PickerSpec>,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl ResourceDescriptor {
    pub fn schema(&self) -> FormSchema {
        self.fields
            .iter()
            .cloned()
            .fold(FormSchema::new(&self.code_field), FormSchema::field)
    }

    pub fn scope(&self) -> PermissionScope {
        PermissionScope::new(&self.key, &self.route)
    }

    /// Empty filter state with the declared cascades
    pub fn filter_state(&self) -> FilterState {
        self.filters
            .iter()
            .filter_map(|f| f.parent.as_deref().map(|p| (p, f.key.as_str())))
            .fold(FilterState::new(), |state, (parent, child)| state.cascade(parent, child))
    }

    pub fn picker(&self, field: &str) -> Option<&PickerSpec> {
        self.pickers.iter().find(|p| p.field == field)
    }

    /// Columns to list; falls back to the form fields when none are declared
    pub fn list_columns(&self) -> Vec<ColumnSpec> {
        if !self.columns.is_empty() {
            return self.columns.clone();
        }
        self.fields
            .iter()
            .map(|f| ColumnSpec {
                key: f.name.clone(),
                title: f.label.clone(),
                width: None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub resources: Vec<ResourceDescriptor>,
}

impl Catalog {
    /// Load and check a catalog file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let source = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "resources.yaml".to_string());
        Self::parse(&source, &filename)
    }

    /// Catalog shipped with the binary
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::parse(DEFAULT_CATALOG, "builtin resources.yaml")
    }

    /// Parse catalog source; structural mistakes are reported with a span
    pub fn parse(source: &str, filename: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_yml::from_str(source)
            .map_err(|e| YamlSyntaxError::from_serde_error(&e, source, filename))?;
        catalog.check(source, filename)?;
        Ok(catalog)
    }

    fn check(&self, source: &str, filename: &str) -> Result<(), YamlSyntaxError> {
        let invalid = |message: String, needle: &str, help: &str| {
            YamlSyntaxError::at_text(message, source, filename, needle, Some(help.to_string()))
        };

        let mut seen = HashSet::new();
        for resource in &self.resources {
            if !seen.insert(resource.key.as_str()) {
                return Err(invalid(
                    format!("duplicate resource key '{}'", resource.key),
                    &format!("key: {}", resource.key),
                    "Resource keys must be unique",
                ));
            }
        }

        for resource in &self.resources {
            let schema = resource.schema();
            if schema.find(&resource.code_field).is_none() {
                return Err(invalid(
                    format!(
                        "resource '{}' uses code_field '{}' which is not a form field",
                        resource.key, resource.code_field
                    ),
                    &format!("code_field: {}", resource.code_field),
                    "code_field must name one of the resource's fields",
                ));
            }

            for filter in &resource.filters {
                if let Some(parent) = &filter.parent {
                    if !resource.filters.iter().any(|f| &f.key == parent) {
                        return Err(invalid(
                            format!("filter '{}' depends on unknown filter '{}'", filter.key, parent),
                            &format!("parent: {}", parent),
                            "A filter's parent must be another filter of the same resource",
                        ));
                    }
                }
            }

            for picker in &resource.pickers {
                if !seen.contains(picker.resource.as_str()) {
                    return Err(invalid(
                        format!(
                            "picker for '{}' references unknown resource '{}'",
                            picker.field, picker.resource
                        ),
                        &format!("resource: {}", picker.resource),
                        "Pickers must reference a resource key defined in this catalog",
                    ));
                }
                if let Some(parent) = &picker.parent {
                    if schema.find(parent).is_none() {
                        return Err(invalid(
                            format!("picker for '{}' depends on unknown field '{}'", picker.field, parent),
                            &format!("parent: {}", parent),
                            "A picker's parent must be a form field of the same resource",
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<&ResourceDescriptor, CatalogError> {
        self.resources
            .iter()
            .find(|r| r.key == key)
            .ok_or_else(|| CatalogError::UnknownResource {
                key: key.to_string(),
                available: self.keys().join(", "),
            })
    }

    pub fn keys(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.key.as_str()).collect()
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("cannot read catalog {path:?}: {message}")]
    #[diagnostic(code(masterdesk::catalog::io))]
    Io { path: PathBuf, message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("unknown resource '{key}'")]
    #[diagnostic(
        code(masterdesk::catalog::unknown_resource),
        help("available resources: {available}")
    )]
    UnknownResource { key: String, available: String },
}

/// Catalog written by `mdesk init`
pub const DEFAULT_CATALOG: &str = r#"# mdesk resource catalog
# One entry per administration screen. Field kinds: text, integer,
# decimal, boolean, reference. Validators: min_length, max_length,
# range, one_of.

resources:
  - key: roles
    path: role
    route: /master/role
    label: Role
    code_field: code
    columns:
      - { key: code, title: Code }
      - { key: name, title: Name }
      - { key: description, title: Description, width: 40 }
    fields:
      - name: code
        label: Code
        required: true
        validators:
          - { rule: max_length, max: 20 }
      - name: name
        label: Name
        required: true
      - name: description
        label: Description

  - key: units
    path: unit-of-measure
    route: /master/unit-of-measure
    label: Unit of Measure
    code_field: code
    columns:
      - { key: code, title: Code }
      - { key: name, title: Name }
      - { key: factor, title: Factor }
    fields:
      - name: code
        label: Code
        required: true
        validators:
          - { rule: max_length, max: 10 }
      - name: name
        label: Name
        required: true
      - name: factor
        label: Factor
        kind: decimal
        validators:
          - { rule: range, min: 0 }

  - key: buildings
    path: building
    route: /master/building
    label: Building
    code_field: code
    columns:
      - { key: code, title: Code }
      - { key: name, title: Name }
      - { key: address, title: Address, width: 40 }
    fields:
      - name: code
        label: Code
        required: true
      - name: name
        label: Name
        required: true
      - name: address
        label: Address

  - key: sections
    path: section
    route: /master/section
    label: Section
    code_field: code
    columns:
      - { key: code, title: Code }
      - { key: name, title: Name }
      - { key: building_name, title: Building }
    filters:
      - { key: building_id, label: Building }
    pickers:
      - { field: building_id, resource: buildings }
    fields:
      - name: code
        label: Code
        required: true
      - name: name
        label: Name
        required: true
      - name: building_id
        label: Building
        kind: reference
        references: buildings
        required: true

  - key: rooms
    path: room
    route: /master/room
    label: Room
    code_field: code
    columns:
      - { key: code, title: Code }
      - { key: name, title: Name }
      - { key: building_name, title: Building }
      - { key: section_name, title: Section }
    filters:
      - { key: building_id, label: Building }
      - { key: section_id, label: Section, parent: building_id }
    pickers:
      - { field: building_id, resource: buildings }
      - { field: section_id, resource: sections, parent: building_id }
    fields:
      - name: code
        label: Code
        required: true
      - name: name
        label: Name
        required: true
      - name: building_id
        label: Building
        kind: reference
        references: buildings
        required: true
      - name: section_id
        label: Section
        kind: reference
        references: sections
        required: true

  - key: billing-terms
    path: billing-term
    route: /master/billing-term
    label: Billing Term
    code_field: code
    columns:
      - { key: code, title: Code }
      - { key: name, title: Name }
      - { key: days, title: Days }
    fields:
      - name: code
        label: Code
        required: true
      - name: name
        label: Name
        required: true
      - name: days
        label: Days
        kind: integer
        required: true
        validators:
          - { rule: range, min: 0, max: 365 }

  - key: key-values
    path: key-value
    route: /master/key-value
    label: Key Value
    code_field: key
    label_field: key
    columns:
      - { key: key, title: Key }
      - { key: value, title: Value, width: 50 }
      - { key: is_active, title: Active }
    fields:
      - name: key
        label: Key
        required: true
      - name: value
        label: Value
        required: true
      - name: is_active
        label: Active
        kind: boolean
"#;
