//! Provisioning steps
//!
//! Each step handles one part of the environment setup. Steps run strictly in
//! the order of [`Step::ALL`] and the first failure aborts the run.

pub mod dependencies;
pub mod editable;
pub mod kernel;
pub mod package_manager;
pub mod pip;

use crate::config::BootstrapConfig;
use crate::env::SessionEnv;
use crate::exec::{CommandRunner, CommandSpec};
use crate::installer::Installer;
use crate::BootstrapError;
use std::sync::Arc;
use std::time::Duration;

/// Provisioning steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Make sure the package manager is on the search path
    PackageManager,
    /// Upgrade the base installer
    Pip,
    /// Install runtime and development libraries
    Dependencies,
    /// Install the project itself in editable mode
    Editable,
    /// Register the notebook kernel
    Kernel,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::PackageManager,
        Step::Pip,
        Step::Dependencies,
        Step::Editable,
        Step::Kernel,
    ];
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::PackageManager => write!(f, "package-manager"),
            Step::Pip => write!(f, "pip"),
            Step::Dependencies => write!(f, "dependencies"),
            Step::Editable => write!(f, "editable"),
            Step::Kernel => write!(f, "kernel"),
        }
    }
}

/// State shared by the steps of one run
pub struct Context {
    pub config: BootstrapConfig,
    pub runner: Arc<dyn CommandRunner>,
    pub env: SessionEnv,
    pub installer: Installer,
    /// Set once the remote installer has been downloaded and run
    pub installer_fetched: bool,
}

impl Context {
    pub fn new(
        config: BootstrapConfig,
        runner: Arc<dyn CommandRunner>,
        env: SessionEnv,
    ) -> Result<Self, BootstrapError> {
        let installer = Installer::new(
            config.installer_url.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )?;
        Ok(Self {
            config,
            runner,
            env,
            installer,
            installer_fetched: false,
        })
    }

    /// Run a command through the configured runner, failing on non-zero exit
    pub(crate) async fn run_checked(&self, spec: &CommandSpec) -> Result<(), BootstrapError> {
        self.runner.run_checked(spec, &self.env).await.map(|_| ())
    }
}

/// Run one step, returning a short description of what it did
pub async fn run_step(step: Step, ctx: &mut Context) -> Result<String, BootstrapError> {
    match step {
        Step::PackageManager => package_manager::run(ctx).await,
        Step::Pip => pip::run(ctx).await,
        Step::Dependencies => dependencies::run(ctx).await,
        Step::Editable => editable::run(ctx).await,
        Step::Kernel => kernel::run(ctx).await,
    }
}

/// Human-readable plan lines for a step, without executing anything
pub fn plan_step(step: Step, config: &BootstrapConfig) -> Vec<String> {
    match step {
        Step::PackageManager => package_manager::plan(config),
        Step::Pip => vec![pip::command(config).display()],
        Step::Dependencies => dependencies::plan(config),
        Step::Editable => vec![editable::command(config).display()],
        Step::Kernel => vec![kernel::install_command(config).display()],
    }
}

/// `<package manager> pip install [flags]`, the prefix of every install command
pub(crate) fn pip_install(config: &BootstrapConfig) -> CommandSpec {
    CommandSpec::new(&config.package_manager)
        .args(["pip", "install"])
        .args(config.install_flags.iter().cloned())
}
