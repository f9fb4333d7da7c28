//! py-bootstrap library
//!
//! Provisions a Python development environment for the project in a working
//! directory:
//!
//! 1. make sure the package manager (`uv` by default) is available, running its
//!    remote installer when it is not
//! 2. upgrade `pip`
//! 3. install the runtime and development libraries (requires `pyproject.toml`)
//! 4. install the project in editable mode
//! 5. register a Jupyter kernel
//!
//! Steps run sequentially and the first failure aborts the run.

pub mod config;
pub mod env;
pub mod exec;
pub mod installer;
pub mod report;
pub mod steps;

mod error;

pub use error::{BootstrapError, EXIT_DESCRIPTOR_NOT_FOUND, EXIT_FAILURE};
pub use report::RunSummary;
pub use steps::{Context, Step};

use config::BootstrapConfig;
use std::time::Instant;
use tracing::info;

/// Run the given steps in order, recording each one in `summary`
pub async fn run_steps(
    ctx: &mut Context,
    steps: &[Step],
    summary: &mut RunSummary,
) -> Result<(), BootstrapError> {
    for step in steps {
        info!("Starting step: {}", step);
        let started = Instant::now();
        let result = steps::run_step(*step, ctx).await;
        summary.record(*step, result.as_deref(), started.elapsed());
        summary.installer_fetched = ctx.installer_fetched;
        result?;
        info!("Completed step: {}", step);
    }
    Ok(())
}

/// Run every step and finalize the summary
pub async fn run_all(ctx: &mut Context) -> (RunSummary, Result<(), BootstrapError>) {
    let mut summary = RunSummary::new(ctx.env.workdir());
    let result = run_steps(ctx, &Step::ALL, &mut summary).await;
    summary.finish(result.as_ref().err());
    (summary, result)
}

/// What a full run would execute, one line per action
pub fn plan(config: &BootstrapConfig) -> Vec<String> {
    Step::ALL
        .iter()
        .flat_map(|step| {
            steps::plan_step(*step, config)
                .into_iter()
                .map(move |line| format!("[{step}] {line}"))
        })
        .collect()
}
