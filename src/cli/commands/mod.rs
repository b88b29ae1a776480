//! CLI command implementations

pub mod utils;

pub mod add;
pub mod completions;
pub mod config;
pub mod delete;
pub mod edit;
pub mod init;
pub mod list;
pub mod options;
pub mod perms;
pub mod resources;
pub mod show;
