//! `mdesk config` command - Configuration management
//!
//! Provides commands to view and modify mdesk configuration.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::commands::utils::find_workspace;
use crate::cli::GlobalOpts;
use crate::core::{Config, RowsPerPage};

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Show paths to configuration files
    Path(PathArgs),

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,

    /// Show only workspace-level config
    #[arg(long = "workspace-only")]
    pub workspace_only: bool,

    /// Show only global (user) config
    #[arg(long = "global-only")]
    pub global_only: bool,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (e.g., api_url, rows_per_page)
    pub key: String,

    /// Value to set
    pub value: String,

    /// Set in global (user) config instead of workspace config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,

    /// Remove from global (user) config instead of workspace config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct PathArgs {
    /// Show only workspace config path
    #[arg(long = "workspace-only")]
    pub workspace_only: bool,

    /// Show only global config path
    #[arg(long = "global-only")]
    pub global_only: bool,
}

/// Valid configuration keys
const VALID_KEYS: &[(&str, &str)] = &[
    ("api_url", "Base URL of the master data API"),
    ("token", "Bearer token sent with every request"),
    ("username", "Actor recorded in the activity log"),
    ("origin", "Origin recorded in the activity log"),
    ("rows_per_page", "Page size for `mdesk list` (20, 50, 100, 500 or 1000)"),
    ("timeout_secs", "Request timeout in seconds"),
    (
        "default_format",
        "Default output format (yaml, json, tsv, etc.)",
    ),
];

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Set(args) => run_set(args, global),
        ConfigCommands::Unset(args) => run_unset(args, global),
        ConfigCommands::Path(args) => run_path(args, global),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = find_workspace(global)?;
    let config = Config::load_for(workspace.as_ref());

    if let Some(key) = &args.key {
        check_key(key)?;
        return match get_config_value(&config, key) {
            Some(v) => {
                println!("{}", v);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    if args.workspace_only && args.global_only {
        return Err(miette::miette!(
            "Cannot specify both --workspace-only and --global-only"
        ));
    }

    if args.workspace_only {
        print_file("Workspace config:", &workspace_config_path(global)?)?;
    } else if args.global_only {
        print_file("Global config:", &global_config_path()?)?;
    } else {
        println!("{}", style("Effective Configuration").bold().underlined());
        println!();

        for (key, _) in VALID_KEYS {
            let value = get_config_value(&config, key);
            match value {
                Some(v) => println!("  {}: {}", style(key).cyan(), style(v).yellow()),
                None => println!("  {}: {}", style(key).cyan(), style("(not set)").dim()),
            }
        }

        println!();
        println!("{}", style("Config Sources (in priority order):").dim());
        println!("  1. Environment variables (MDESK_API_URL, MDESK_TOKEN, MDESK_USER, MDESK_ORIGIN)");
        println!("  2. Workspace config (.mdesk/config.yaml)");
        println!("  3. Global config (~/.config/mdesk/config.yaml)");
    }

    Ok(())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    check_key(&args.key)?;
    let value = parse_value(&args.key, &args.value)?;

    let config_path = if args.global {
        global_config_path()?
    } else {
        workspace_config_path(global)?
    };

    let mut config_map = read_mapping(&config_path)?;
    config_map.insert(serde_yml::Value::String(args.key.clone()), value);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    let scope = if args.global { "global" } else { "workspace" };
    println!(
        "{} Set {} {} {} in {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        style("⮕").dim(),
        style(&args.value).yellow(),
        scope
    );

    Ok(())
}

fn run_unset(args: UnsetArgs, global: &GlobalOpts) -> Result<()> {
    check_key(&args.key)?;
    let config_path = if args.global {
        global_config_path()?
    } else {
        workspace_config_path(global)?
    };

    if !config_path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            config_path.display()
        ));
    }

    let mut config_map = read_mapping(&config_path)?;
    if config_map.remove(args.key.as_str()).is_none() {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }

    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    let scope = if args.global { "global" } else { "workspace" };
    println!(
        "{} Removed {} from {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        scope
    );

    Ok(())
}

fn run_path(args: PathArgs, global: &GlobalOpts) -> Result<()> {
    if args.workspace_only && args.global_only {
        return Err(miette::miette!(
            "Cannot specify both --workspace-only and --global-only"
        ));
    }

    if args.workspace_only {
        println!("{}", workspace_config_path(global)?.display());
        return Ok(());
    }
    if args.global_only {
        println!("{}", global_config_path()?.display());
        return Ok(());
    }

    println!("{}", style("Configuration file paths:").bold());
    println!();
    if let Ok(path) = global_config_path() {
        print_path("Global:", &path);
    }
    println!();
    match workspace_config_path(global) {
        Ok(path) => print_path("Workspace:", &path),
        Err(_) => println!(
            "  {} {}",
            style("Workspace:").cyan(),
            style("(not in an mdesk workspace)").dim()
        ),
    }

    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();

    for (key, description) in VALID_KEYS {
        println!("  {:<20} {}", style(key).cyan(), style(description).dim());
    }

    println!();
    println!(
        "{}",
        style("Use 'mdesk config set <key> <value>' to set a value.").dim()
    );

    Ok(())
}

fn check_key(key: &str) -> Result<()> {
    if VALID_KEYS.iter().any(|(k, _)| *k == key) {
        return Ok(());
    }
    let keys: Vec<&str> = VALID_KEYS.iter().map(|(k, _)| *k).collect();
    Err(miette::miette!(
        help = format!("Valid keys: {}", keys.join(", ")),
        "Unknown configuration key '{}'",
        key
    ))
}

/// Numeric keys are stored as numbers so the config file deserializes
fn parse_value(key: &str, raw: &str) -> Result<serde_yml::Value> {
    match key {
        "rows_per_page" => {
            let rows: u32 = raw
                .parse()
                .map_err(|_| miette::miette!("rows_per_page must be a number, got '{}'", raw))?;
            RowsPerPage::try_from(rows).map_err(|e| miette::miette!("{}", e))?;
            Ok(serde_yml::Value::Number(rows.into()))
        }
        "timeout_secs" => {
            let secs: u64 = raw
                .parse()
                .map_err(|_| miette::miette!("timeout_secs must be a number, got '{}'", raw))?;
            Ok(serde_yml::Value::Number(secs.into()))
        }
        _ => Ok(serde_yml::Value::String(raw.to_string())),
    }
}

fn read_mapping(path: &Path) -> Result<serde_yml::Mapping> {
    if !path.exists() {
        return Ok(serde_yml::Mapping::new());
    }
    let content = fs::read_to_string(path).into_diagnostic()?;
    let only_comments = content
        .lines()
        .all(|line| line.trim().is_empty() || line.trim_start().starts_with('#'));
    if only_comments {
        return Ok(serde_yml::Mapping::new());
    }
    match serde_yml::from_str::<serde_yml::Value>(&content) {
        Ok(serde_yml::Value::Mapping(map)) => Ok(map),
        Ok(serde_yml::Value::Null) => Ok(serde_yml::Mapping::new()),
        Ok(_) => Err(miette::miette!("{} is not a mapping", path.display())),
        Err(e) => Err(miette::miette!("{}: {}", path.display(), e)),
    }
}

fn global_config_path() -> Result<PathBuf> {
    Config::global_config_path()
        .ok_or_else(|| miette::miette!("Could not determine global config directory"))
}

fn workspace_config_path(global: &GlobalOpts) -> Result<PathBuf> {
    find_workspace(global)?
        .map(|ws| ws.config_path())
        .ok_or_else(|| {
            miette::miette!(
                help = "Run 'mdesk init' or use --global",
                "Not in an mdesk workspace"
            )
        })
}

fn get_config_value(config: &Config, key: &str) -> Option<String> {
    match key {
        "api_url" => config.api_url.clone(),
        "token" => config.token.as_deref().map(mask_token),
        "username" => config.username.clone(),
        "origin" => config.origin.clone(),
        "rows_per_page" => config.rows_per_page.map(|n| n.to_string()),
        "timeout_secs" => config.timeout_secs.map(|n| n.to_string()),
        "default_format" => config.default_format.clone(),
        _ => None,
    }
}

fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    format!("{}****", visible)
}

fn print_path(label: &str, path: &Path) {
    println!("  {} {}", style(label).cyan(), path.display());
    if path.exists() {
        println!("         {}", style("(exists)").green());
    } else {
        println!("         {}", style("(not created)").dim());
    }
}

fn print_file(label: &str, path: &Path) -> Result<()> {
    println!("{} {}", style(label).bold(), style(path.display()).dim());
    println!();
    if path.exists() {
        print!("{}", fs::read_to_string(path).into_diagnostic()?);
    } else {
        println!("{}", style("(not created)").dim());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_numbers() {
        assert_eq!(
            parse_value("rows_per_page", "50").unwrap(),
            serde_yml::Value::Number(50u32.into())
        );
        assert!(parse_value("rows_per_page", "7").is_err());
        assert!(parse_value("timeout_secs", "soon").is_err());
        assert_eq!(
            parse_value("api_url", "http://localhost").unwrap(),
            serde_yml::Value::String("http://localhost".to_string())
        );
    }

    #[test]
    fn test_check_key() {
        assert!(check_key("api_url").is_ok());
        assert!(check_key("author").is_err());
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("abcdefgh"), "abcd****");
        assert_eq!(mask_token("ab"), "ab****");
    }
}
