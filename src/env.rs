//! Session environment
//!
//! The search path of a run lives here instead of in the process environment.
//! Every spawned command gets `PATH` from [`SessionEnv::path_var`], so a
//! freshly installed package manager is visible to the steps that follow.

use crate::BootstrapError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Search path and working directory shared by all steps of one run
#[derive(Debug, Clone)]
pub struct SessionEnv {
    search_path: Vec<PathBuf>,
    workdir: PathBuf,
    home: Option<PathBuf>,
}

impl SessionEnv {
    /// Build from an explicit search path (useful for testing)
    pub fn new(search_path: Vec<PathBuf>, workdir: impl AsRef<Path>) -> Self {
        Self {
            search_path,
            workdir: workdir.as_ref().to_path_buf(),
            home: None,
        }
    }

    /// Capture `PATH` and `HOME` from the current process
    pub fn from_process(workdir: impl AsRef<Path>) -> Self {
        let search_path = std::env::var_os("PATH")
            .map(|p| std::env::split_paths(&p).collect())
            .unwrap_or_default();
        Self {
            search_path,
            workdir: workdir.as_ref().to_path_buf(),
            home: std::env::var_os("HOME").map(PathBuf::from),
        }
    }

    /// Set the home directory used for `~` expansion
    pub fn with_home(mut self, home: impl AsRef<Path>) -> Self {
        self.home = Some(home.as_ref().to_path_buf());
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// `PATH` value handed to child processes
    pub fn path_var(&self) -> Result<OsString, BootstrapError> {
        std::env::join_paths(&self.search_path)
            .map_err(|e| BootstrapError::Config(format!("invalid search path entry: {e}")))
    }

    /// Put `dir` in front of the search path, dropping any later duplicate
    pub fn prepend(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        self.search_path.retain(|p| p != &dir);
        debug!("Prepending {} to session search path", dir.display());
        self.search_path.insert(0, dir);
    }

    /// Resolve an executable on the session search path
    pub fn resolve(&self, program: &str) -> Option<PathBuf> {
        let path = self.path_var().ok()?;
        which::which_in(program, Some(path), &self.workdir).ok()
    }

    /// Expand a leading `~` or `$HOME` against the session's home directory
    pub fn expand_home(&self, raw: &str) -> PathBuf {
        let rest = raw
            .strip_prefix('~')
            .or_else(|| raw.strip_prefix("$HOME"));
        match (rest, &self.home) {
            (Some(rest), Some(home)) if rest.is_empty() => home.clone(),
            (Some(rest), Some(home)) if rest.starts_with('/') => {
                home.join(rest.trim_start_matches('/'))
            }
            _ => PathBuf::from(raw),
        }
    }
}
