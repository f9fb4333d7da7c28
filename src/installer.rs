//! Remote package manager installer
//!
//! Downloads the installer shell script and pipes it to `sh`, the equivalent of
//! `curl -LsSf <url> | sh`.

use crate::BootstrapError;
use crate::env::SessionEnv;
use crate::exec::{CommandRunner, CommandSpec};
use std::time::Duration;
use tracing::{debug, info};

/// Fetches and runs an installer script
#[derive(Debug, Clone)]
pub struct Installer {
    client: reqwest::Client,
    url: String,
}

impl Installer {
    /// Create an installer for `url` with a request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, BootstrapError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("py-bootstrap/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download the installer script
    pub async fn fetch(&self) -> Result<String, BootstrapError> {
        info!("Fetching installer from {}", self.url);

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BootstrapError::Installer(format!(
                "{} returned HTTP {}",
                self.url, status
            )));
        }

        let script = response.text().await?;
        if script.trim().is_empty() {
            return Err(BootstrapError::Installer(format!(
                "{} returned an empty script",
                self.url
            )));
        }

        debug!("Fetched installer script ({} bytes)", script.len());
        Ok(script)
    }

    /// Download the installer and run it with `sh`
    pub async fn install(
        &self,
        runner: &dyn CommandRunner,
        env: &SessionEnv,
    ) -> Result<(), BootstrapError> {
        let script = self.fetch().await?;
        self.run_script(script, runner, env).await
    }

    /// Run an already downloaded installer script with `sh`
    pub async fn run_script(
        &self,
        script: String,
        runner: &dyn CommandRunner,
        env: &SessionEnv,
    ) -> Result<(), BootstrapError> {
        runner
            .run_checked(&CommandSpec::new("sh").stdin(script), env)
            .await?;
        info!("Installer from {} completed", self.url);
        Ok(())
    }
}
