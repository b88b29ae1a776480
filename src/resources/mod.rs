//! Resource definitions: the YAML catalog and typed records for the
//! built-in master data tables

pub mod catalog;
pub mod records;

pub use catalog::{
    Catalog, CatalogError, ColumnSpec, FilterSpec, PickerSpec, ResourceDescriptor, DEFAULT_CATALOG,
};
pub use records::{Role, UnitOfMeasure};
