//! Package manager step
//!
//! Looks the package manager up on the session search path. When it is
//! missing, the remote installer is fetched and run, then the installer's
//! target directories are put in front of the search path for the rest of the
//! run.

use super::Context;
use crate::BootstrapError;
use crate::config::BootstrapConfig;
use tracing::{debug, info};

pub async fn run(ctx: &mut Context) -> Result<String, BootstrapError> {
    let name = ctx.config.package_manager.clone();

    if let Some(path) = ctx.env.resolve(&name) {
        info!("{} already available at {}", name, path.display());
        return Ok(format!("found {}", path.display()));
    }

    info!("{} not found on the search path, running installer", name);
    let script = ctx.installer.fetch().await?;
    ctx.installer_fetched = true;
    ctx.installer
        .run_script(script, ctx.runner.as_ref(), &ctx.env)
        .await?;

    // Reverse so the first configured directory ends up first
    for dir in ctx.config.installer_dirs.iter().rev() {
        let dir = ctx.env.expand_home(dir);
        ctx.env.prepend(dir);
    }
    debug!("Session search path: {:?}", ctx.env.search_path());

    match ctx.env.resolve(&name) {
        Some(path) => {
            info!("Installed {} at {}", name, path.display());
            Ok(format!("installed {}", path.display()))
        }
        None => Err(BootstrapError::PackageManagerUnavailable(name)),
    }
}

pub fn plan(config: &BootstrapConfig) -> Vec<String> {
    vec![
        format!(
            "if {} is not on PATH: fetch {} | sh",
            config.package_manager, config.installer_url
        ),
        format!(
            "  then prepend {} to PATH",
            config.installer_dirs.join(", ")
        ),
    ]
}
