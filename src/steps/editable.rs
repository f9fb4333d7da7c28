//! Editable install of the current project

use super::{Context, pip_install};
use crate::BootstrapError;
use crate::config::BootstrapConfig;
use crate::exec::CommandSpec;
use tracing::info;

pub fn command(config: &BootstrapConfig) -> CommandSpec {
    pip_install(config).args(["-e", "."])
}

pub async fn run(ctx: &mut Context) -> Result<String, BootstrapError> {
    info!("Installing {} in editable mode", ctx.env.workdir().display());
    ctx.run_checked(&command(&ctx.config)).await?;
    Ok("installed project in editable mode".to_string())
}
