//! masterdesk: table and workflow engine for master data administration
//!
//! Paged, sorted and filtered resource tables with add/edit/delete/view
//! workflows, permission gating, cascading pickers and an audit trail,
//! driven against a REST backend through a pluggable gateway.

pub mod cli;
pub mod core;
pub mod resources;
pub mod yaml;
