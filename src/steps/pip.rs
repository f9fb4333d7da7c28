//! Pip upgrade step

use super::{Context, pip_install};
use crate::BootstrapError;
use crate::config::BootstrapConfig;
use crate::exec::CommandSpec;
use tracing::info;

pub fn command(config: &BootstrapConfig) -> CommandSpec {
    pip_install(config).arg("--upgrade").arg(&config.pip_package)
}

pub async fn run(ctx: &mut Context) -> Result<String, BootstrapError> {
    info!("Upgrading {}", ctx.config.pip_package);
    ctx.run_checked(&command(&ctx.config)).await?;
    Ok(format!("upgraded {}", ctx.config.pip_package))
}
