//! Core module - engine components and shared types

pub mod audit;
pub mod config;
pub mod envelope;
pub mod filter;
pub mod form;
pub mod gateway;
pub mod http;
pub mod pagination;
pub mod permission;
pub mod picker;
pub mod record;
pub mod screen;
pub mod store;
pub mod workflow;
pub mod workspace;

pub use audit::{AuditAction, AuditEntry, AuditLogger};
pub use config::Config;
pub use envelope::{Envelope, ListPage, PermissionPayload};
pub use filter::FilterState;
pub use form::{FieldKind, FieldSchema, FieldValue, FieldValues, FormMode, FormSchema, FormState, Validator};
pub use gateway::{ApiGateway, GatewayError, ListQuery};
pub use http::HttpGateway;
pub use pagination::{PageMeta, Pagination, RowsPerPage, SortDirection};
pub use permission::{Action, PermissionGate, PermissionScope, PermissionSet};
pub use picker::{DependentOption, DependentPickerCache, PickerOutcome, ScrollTrigger};
pub use record::{DynamicRecord, Record, RecordId};
pub use screen::ResourceScreen;
pub use store::{FetchOutcome, LoadState, PagedCollectionStore};
pub use workflow::{FormWorkflowController, Notice, NoticeLevel, SubmitOutcome};
pub use workspace::{Workspace, WorkspaceError};
