//! Bootstrap config loader
//!
//! Resolution order:
//! 1. An explicitly named file (must exist)
//! 2. `py-bootstrap.yaml` in the project directory (optional)
//! 3. Built-in defaults

use super::BootstrapConfig;
use crate::BootstrapError;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Config file picked up from the project directory when present
pub const DEFAULT_CONFIG_FILE: &str = "py-bootstrap.yaml";

/// Configuration loader builder
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    project_dir: PathBuf,
    explicit: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader rooted at the current directory
    pub fn new() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            explicit: None,
        }
    }

    /// Look for the default config file in this directory
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Load this file instead of the default one
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.explicit = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load, parse and validate the config
    pub async fn load(self) -> Result<BootstrapConfig, BootstrapError> {
        let config = match &self.explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(BootstrapError::Config(format!(
                        "config file {} does not exist",
                        path.display()
                    )));
                }
                load_config_file(path).await?
            }
            None => {
                let path = self.project_dir.join(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    load_config_file(&path).await?
                } else {
                    debug!("No {} found, using built-in defaults", path.display());
                    BootstrapConfig::default()
                }
            }
        };

        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

async fn load_config_file(path: &Path) -> Result<BootstrapConfig, BootstrapError> {
    let content = fs::read_to_string(path).await?;
    let config = BootstrapConfig::from_yaml(&content).map_err(|e| {
        BootstrapError::Config(format!("failed to parse {}: {}", path.display(), e))
    })?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}
