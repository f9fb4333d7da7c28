//! Notebook kernel registration and lookup
//!
//! Registration goes through `ipykernel install --user`, which overwrites an
//! existing kernel of the same name. Lookup parses
//! `jupyter kernelspec list --json`.

use super::Context;
use crate::BootstrapError;
use crate::config::{BootstrapConfig, KernelConfig};
use crate::env::SessionEnv;
use crate::exec::{CommandRunner, CommandSpec};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// `python -m ipykernel install --user --name <id> --display-name <name>`
pub fn install_command(config: &BootstrapConfig) -> CommandSpec {
    CommandSpec::new(&config.python)
        .args(["-m", "ipykernel", "install", "--user", "--name"])
        .arg(&config.kernel.id)
        .arg("--display-name")
        .arg(&config.kernel.display_name)
}

/// `python -m jupyter kernelspec list --json`
pub fn list_command(config: &BootstrapConfig) -> CommandSpec {
    CommandSpec::new(&config.python).args(["-m", "jupyter", "kernelspec", "list", "--json"])
}

pub async fn run(ctx: &mut Context) -> Result<String, BootstrapError> {
    info!(
        "Registering kernel '{}' ({})",
        ctx.config.kernel.id, ctx.config.kernel.display_name
    );
    ctx.run_checked(&install_command(&ctx.config)).await?;
    Ok(format!("registered kernel {}", ctx.config.kernel.id))
}

#[derive(Debug, Deserialize)]
struct KernelSpecListing {
    #[serde(default)]
    kernelspecs: BTreeMap<String, KernelSpecEntry>,
}

#[derive(Debug, Deserialize)]
struct KernelSpecEntry {
    spec: KernelSpecBody,
}

#[derive(Debug, Deserialize)]
struct KernelSpecBody {
    display_name: String,
}

/// Parse kernel listing JSON into kernel id -> display name
pub fn parse_listing(json: &str) -> Result<BTreeMap<String, String>, BootstrapError> {
    let listing: KernelSpecListing = serde_json::from_str(json)?;
    Ok(listing
        .kernelspecs
        .into_iter()
        .map(|(id, entry)| (id, entry.spec.display_name))
        .collect())
}

/// Query the installed kernels
pub async fn installed_kernels(
    runner: &dyn CommandRunner,
    env: &SessionEnv,
    config: &BootstrapConfig,
) -> Result<BTreeMap<String, String>, BootstrapError> {
    let output = runner.run_checked(&list_command(config), env).await?;
    let kernels = parse_listing(&output.stdout)?;
    debug!("Found {} kernels", kernels.len());
    Ok(kernels)
}

/// Registration state of the configured kernel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelStatus {
    Registered,
    /// Present under the id, but with another display name
    DisplayNameMismatch(String),
    Missing,
}

impl KernelStatus {
    pub fn of(kernels: &BTreeMap<String, String>, kernel: &KernelConfig) -> Self {
        match kernels.get(&kernel.id) {
            Some(name) if name == &kernel.display_name => Self::Registered,
            Some(name) => Self::DisplayNameMismatch(name.clone()),
            None => Self::Missing,
        }
    }
}

/// Check the configured kernel against the installed ones
pub async fn check(
    runner: &dyn CommandRunner,
    env: &SessionEnv,
    config: &BootstrapConfig,
) -> Result<KernelStatus, BootstrapError> {
    let kernels = installed_kernels(runner, env, config).await?;
    Ok(KernelStatus::of(&kernels, &config.kernel))
}
