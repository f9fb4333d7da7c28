//! Run summary
//!
//! A JSON record of the last run, written after every `run` whether it
//! succeeded or not.

use crate::BootstrapError;
use crate::steps::Step;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Ok,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: String,
    pub status: StepStatus,
    pub detail: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub version: String,
    pub workdir: String,
    pub steps: Vec<StepRecord>,
    pub installer_fetched: bool,
    pub succeeded: bool,
    pub error: Option<String>,
    /// Seconds since the Unix epoch
    pub finished_at: u64,
}

impl RunSummary {
    pub fn new(workdir: &Path) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            workdir: workdir.display().to_string(),
            steps: Vec::new(),
            installer_fetched: false,
            succeeded: false,
            error: None,
            finished_at: 0,
        }
    }

    pub fn record(&mut self, step: Step, result: Result<&str, &BootstrapError>, elapsed: Duration) {
        let (status, detail) = match result {
            Ok(detail) => (StepStatus::Ok, detail.to_string()),
            Err(e) => (StepStatus::Failed, e.to_string()),
        };
        self.steps.push(StepRecord {
            step: step.to_string(),
            status,
            detail,
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        });
    }

    /// Mark the run finished with the overall outcome
    pub fn finish(&mut self, error: Option<&BootstrapError>) {
        self.succeeded = error.is_none();
        self.error = error.map(ToString::to_string);
        self.finished_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
    }

    pub async fn write(&self, path: &Path) -> Result<(), BootstrapError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?).await?;
        debug!("Wrote run summary to {}", path.display());
        Ok(())
    }

    /// Read a summary back; `None` when no run has been recorded yet
    pub async fn load(path: &Path) -> Result<Option<Self>, BootstrapError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).await?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}
