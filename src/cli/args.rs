//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    add::AddArgs, completions::CompletionsArgs, config::ConfigCommands, delete::DeleteArgs,
    edit::EditArgs, init::InitArgs, list::ListArgs, options::OptionsArgs, perms::PermsArgs,
    resources::ResourcesArgs, show::ShowArgs,
};

#[derive(Parser)]
#[command(name = "mdesk")]
#[command(author, version, about = "Master data administration from the terminal")]
#[command(long_about = "Browse, filter and edit master data tables (roles, units, buildings, ...) \
    of a REST backend, with permission checks and an audit trail for every change.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Workspace root (default: auto-detect by finding .mdesk/)
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// API base URL (overrides configuration)
    #[arg(long, global = true, env = "MDESK_API_URL")]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new mdesk workspace
    Init(InitArgs),

    /// List the resources defined in the catalog
    Resources(ResourcesArgs),

    /// List records of a resource (paged, sorted, filtered)
    List(ListArgs),

    /// Show one record
    Show(ShowArgs),

    /// Create a record
    Add(AddArgs),

    /// Update a record
    Edit(EditArgs),

    /// Delete a record
    Delete(DeleteArgs),

    /// Show which actions you may perform on a resource
    Perms(PermsArgs),

    /// List the options of a reference field (cascading pickers)
    Options(OptionsArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}
