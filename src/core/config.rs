//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::pagination::RowsPerPage;
use crate::core::workspace::Workspace;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// mdesk configuration with layered hierarchy
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the master data API
    pub api_url: Option<String>,

    /// Bearer token attached to every request
    pub token: Option<String>,

    /// Actor recorded in the activity log
    pub username: Option<String>,

    /// Origin recorded in the activity log
    pub origin: Option<String>,

    /// Page size for list commands
    pub rows_per_page: Option<u32>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let workspace = Workspace::discover().ok();
        Self::load_for(workspace.as_ref())
    }

    /// Same as `load()` with an explicit workspace (or none)
    pub fn load_for(workspace: Option<&Workspace>) -> Self {
        let mut config = Config::default();

        // 1. Global user config (~/.config/mdesk/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 2. Workspace config (.mdesk/config.yaml)
        if let Some(workspace) = workspace {
            if let Some(local) = Self::read_file(&workspace.config_path()) {
                config.merge(local);
            }
        }

        // 3. Environment variables
        config.merge(Self::from_env());
        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        serde_yml::from_str::<Config>(&contents).ok()
    }

    fn from_env() -> Config {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Config {
            api_url: var("MDESK_API_URL"),
            token: var("MDESK_TOKEN"),
            username: var("MDESK_USER"),
            origin: var("MDESK_ORIGIN"),
            ..Config::default()
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "mdesk").map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.api_url.is_some() {
            self.api_url = other.api_url;
        }
        if other.token.is_some() {
            self.token = other.token;
        }
        if other.username.is_some() {
            self.username = other.username;
        }
        if other.origin.is_some() {
            self.origin = other.origin;
        }
        if other.rows_per_page.is_some() {
            self.rows_per_page = other.rows_per_page;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Get the actor name, falling back to the login name
    pub fn username(&self) -> String {
        if let Some(ref username) = self.username {
            return username.clone();
        }
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    /// Configured origin, or the host operating system
    pub fn origin(&self) -> String {
        self.origin
            .clone()
            .unwrap_or_else(|| std::env::consts::OS.to_string())
    }

    /// Configured page size; unsupported values fall back to the default
    pub fn rows_per_page(&self) -> RowsPerPage {
        self.rows_per_page
            .and_then(|n| RowsPerPage::try_from(n).ok())
            .unwrap_or_default()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_later_layer() {
        let mut base = Config {
            api_url: Some("http://global".to_string()),
            username: Some("alice".to_string()),
            ..Config::default()
        };
        base.merge(Config {
            api_url: Some("http://local".to_string()),
            ..Config::default()
        });
        assert_eq!(base.api_url.as_deref(), Some("http://local"));
        assert_eq!(base.username(), "alice");
    }

    #[test]
    fn test_rows_per_page_falls_back_for_unsupported_values() {
        let config = Config {
            rows_per_page: Some(37),
            ..Config::default()
        };
        assert_eq!(config.rows_per_page(), RowsPerPage::default());

        let config = Config {
            rows_per_page: Some(100),
            ..Config::default()
        };
        assert_eq!(config.rows_per_page().get(), 100);
    }

    #[test]
    fn test_origin_defaults_to_os() {
        assert_eq!(Config::default().origin(), std::env::consts::OS);
        assert_eq!(Config::default().timeout(), Duration::from_secs(30));
    }
}
