//! Error types for py-bootstrap

use std::path::PathBuf;
use thiserror::Error;

/// Exit code used when the project descriptor file is missing
pub const EXIT_DESCRIPTOR_NOT_FOUND: u8 = 2;

/// Exit code for every other failure
pub const EXIT_FAILURE: u8 = 1;

/// Main error type for py-bootstrap operations
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Project descriptor not found: {}", .0.display())]
    DescriptorNotFound(PathBuf),

    #[error("Command '{program}' exited with status {code}: {stderr}")]
    CommandFailed {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Installer error: {0}")]
    Installer(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Package manager '{0}' is not available on the search path")]
    PackageManagerUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BootstrapError {
    /// Create a command failure error
    pub fn command_failed(
        program: impl Into<String>,
        code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            program: program.into(),
            code: code.unwrap_or(-1),
            stderr: stderr.into(),
        }
    }

    /// Create a spawn error
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::DescriptorNotFound(_) => EXIT_DESCRIPTOR_NOT_FOUND,
            _ => EXIT_FAILURE,
        }
    }
}
