//! Workspace discovery and layout
//!
//! A workspace is any directory holding a `.mdesk/` folder with the local
//! `config.yaml` and the `resources.yaml` catalog.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::resources::DEFAULT_CATALOG;

/// Name of the workspace marker directory
pub const WORKSPACE_DIR: &str = ".mdesk";

#[derive(Debug)]
pub struct Workspace {
    /// Directory containing `.mdesk/`
    root: PathBuf,
}

impl Workspace {
    /// Find the workspace by walking up from the current directory
    pub fn discover() -> Result<Self, WorkspaceError> {
        let current = std::env::current_dir().map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find the workspace by walking up from `start`
    pub fn discover_from(start: &Path) -> Result<Self, WorkspaceError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Ok(Self { root: current });
            }
            if !current.pop() {
                return Err(WorkspaceError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create `.mdesk/` with a default config and the built-in catalog
    pub fn init(path: &Path, force: bool) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let dir = root.join(WORKSPACE_DIR);
        if dir.exists() && !force {
            return Err(WorkspaceError::AlreadyExists(root));
        }

        std::fs::create_dir_all(&dir).map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        std::fs::write(dir.join("config.yaml"), Self::default_config())
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        std::fs::write(dir.join("resources.yaml"), DEFAULT_CATALOG)
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# mdesk workspace configuration
# Values here override ~/.config/mdesk/config.yaml and are
# overridden by MDESK_API_URL, MDESK_TOKEN, MDESK_USER and MDESK_ORIGIN.

# Base URL of the master data API
# api_url: "http://localhost:8080/api"

# Username recorded in the activity log
# username: ""

# Origin recorded in the activity log (default: host operating system)
# origin: ""

# Rows per page for list commands (20, 50, 100, 500, 1000)
# rows_per_page: 20

# Request timeout in seconds
# timeout_secs: 30

# Default output format (auto, tsv, csv, md, json, yaml, id)
# default_format: auto
"#
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `.mdesk/` directory
    pub fn dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir().join("config.yaml")
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.dir().join("resources.yaml")
    }
}

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("not an mdesk workspace (searched from {searched_from:?}). Run 'mdesk init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("mdesk workspace already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_writes_config_and_catalog() {
        let tmp = tempdir().unwrap();
        let ws = Workspace::init(tmp.path(), false).unwrap();

        assert!(ws.dir().is_dir());
        assert!(ws.config_path().exists());
        let catalog = std::fs::read_to_string(ws.catalog_path()).unwrap();
        assert!(catalog.contains("resources:"));
    }

    #[test]
    fn test_init_refuses_existing_without_force() {
        let tmp = tempdir().unwrap();
        Workspace::init(tmp.path(), false).unwrap();

        let err = Workspace::init(tmp.path(), false).unwrap_err();
        assert!(matches!(err, WorkspaceError::AlreadyExists(_)));
        assert!(Workspace::init(tmp.path(), true).is_ok());
    }

    #[test]
    fn test_discover_walks_up() {
        let tmp = tempdir().unwrap();
        Workspace::init(tmp.path(), false).unwrap();
        let nested = tmp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let ws = Workspace::discover_from(&nested).unwrap();
        assert_eq!(ws.root(), tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_discover_fails_outside_workspace() {
        let tmp = tempdir().unwrap();
        let err = Workspace::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, WorkspaceError::NotFound { .. }));
    }
}
