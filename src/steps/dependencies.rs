//! Dependencies step
//!
//! Requires the project descriptor in the working directory. Runtime libraries
//! are installed first, then the development-only ones.

use super::{Context, pip_install};
use crate::BootstrapError;
use crate::config::BootstrapConfig;
use crate::exec::CommandSpec;
use tracing::{error, info};

/// Install commands for the configured lists; an empty list has no command
pub fn commands(config: &BootstrapConfig) -> Vec<CommandSpec> {
    [&config.runtime_dependencies, &config.dev_dependencies]
        .into_iter()
        .filter(|deps| !deps.is_empty())
        .map(|deps| pip_install(config).args(deps.iter().cloned()))
        .collect()
}

pub fn plan(config: &BootstrapConfig) -> Vec<String> {
    let mut lines = vec![format!("require ./{}", config.descriptor)];
    lines.extend(commands(config).iter().map(CommandSpec::display));
    lines
}

pub async fn run(ctx: &mut Context) -> Result<String, BootstrapError> {
    let descriptor = ctx.env.workdir().join(&ctx.config.descriptor);
    if !descriptor.is_file() {
        error!("{} not found", descriptor.display());
        return Err(BootstrapError::DescriptorNotFound(descriptor));
    }

    info!(
        "Installing {} runtime and {} development dependencies",
        ctx.config.runtime_dependencies.len(),
        ctx.config.dev_dependencies.len()
    );
    for spec in commands(&ctx.config) {
        ctx.run_checked(&spec).await?;
    }

    Ok(format!(
        "installed {} packages",
        ctx.config.runtime_dependencies.len() + ctx.config.dev_dependencies.len()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_before_dev() {
        let config = BootstrapConfig {
            runtime_dependencies: vec!["requests".to_string()],
            dev_dependencies: vec!["pytest".to_string(), "ipykernel".to_string()],
            ..Default::default()
        };
        let lines: Vec<String> = commands(&config).iter().map(CommandSpec::display).collect();
        assert_eq!(
            lines,
            vec!["uv pip install requests", "uv pip install pytest ipykernel"]
        );
    }

    #[test]
    fn test_empty_list_is_skipped() {
        let config = BootstrapConfig {
            runtime_dependencies: Vec::new(),
            ..Default::default()
        };
        let specs = commands(&config);
        assert_eq!(specs.len(), 1);
        assert!(specs[0].args.contains(&"ipykernel".to_string()));
    }

    #[test]
    fn test_plan_starts_with_descriptor_check() {
        let plan = plan(&BootstrapConfig::default());
        assert_eq!(plan[0], "require ./pyproject.toml");
        assert_eq!(plan.len(), 3);
    }
}
