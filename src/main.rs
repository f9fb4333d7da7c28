//! py-bootstrap - provision a Python development environment
//!
//! Running without a subcommand performs the full bootstrap.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use py_bootstrap::config::ConfigLoader;
use py_bootstrap::env::SessionEnv;
use py_bootstrap::exec::SystemRunner;
use py_bootstrap::report::RunSummary;
use py_bootstrap::steps::kernel::{self, KernelStatus};
use py_bootstrap::{BootstrapError, Context, EXIT_FAILURE};

#[derive(Parser)]
#[command(name = "py-bootstrap")]
#[command(author, version, about = "Provision a Python development environment", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file (default: py-bootstrap.yaml in the project directory)
    #[arg(short, long, env = "PY_BOOTSTRAP_CONFIG")]
    config: Option<PathBuf>,

    /// Project directory
    #[arg(short, long, env = "PY_BOOTSTRAP_PROJECT_DIR", default_value = ".")]
    project_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every provisioning step (default)
    Run,
    /// Print the commands a run would execute
    Plan,
    /// Verify that the notebook kernel is registered
    Check,
    /// Show the summary of the last run
    Status,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute(cli).await {
        Ok(code) => code,
        Err(err) => {
            let code = err
                .chain()
                .find_map(|e| e.downcast_ref::<BootstrapError>())
                .map_or(EXIT_FAILURE, BootstrapError::exit_code);
            eprintln!("Error: {err:#}");
            ExitCode::from(code)
        }
    }
}

async fn execute(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut loader = ConfigLoader::new().with_project_dir(&cli.project_dir);
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    }
    let config = loader.load().await.context("loading configuration")?;
    let summary_path = cli.project_dir.join(&config.summary_path);
    let env = SessionEnv::from_process(&cli.project_dir);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            info!("Bootstrapping {}", cli.project_dir.display());
            let kernel_id = config.kernel.id.clone();
            let mut ctx = Context::new(config, Arc::new(SystemRunner), env)?;
            let (summary, result) = py_bootstrap::run_all(&mut ctx).await;

            if let Err(e) = summary.write(&summary_path).await {
                warn!("Could not write run summary: {}", e);
            }

            result?;
            println!("Environment ready; kernel '{kernel_id}' registered");
        }
        Commands::Plan => {
            for line in py_bootstrap::plan(&config) {
                println!("{line}");
            }
        }
        Commands::Check => {
            let status = kernel::check(&SystemRunner, &env, &config)
                .await
                .context("listing notebook kernels")?;
            match status {
                KernelStatus::Registered => {
                    println!(
                        "Kernel '{}' registered as '{}'",
                        config.kernel.id, config.kernel.display_name
                    );
                }
                KernelStatus::DisplayNameMismatch(found) => {
                    println!(
                        "Kernel '{}' registered as '{}', expected '{}'",
                        config.kernel.id, found, config.kernel.display_name
                    );
                    return Ok(ExitCode::from(EXIT_FAILURE));
                }
                KernelStatus::Missing => {
                    println!("Kernel '{}' is not registered", config.kernel.id);
                    return Ok(ExitCode::from(EXIT_FAILURE));
                }
            }
        }
        Commands::Status => match RunSummary::load(&summary_path).await? {
            Some(summary) => {
                let outcome = if summary.succeeded { "succeeded" } else { "failed" };
                println!("Last run {} (finished at {})", outcome, summary.finished_at);
                for record in &summary.steps {
                    println!(
                        "  {:<16} {:?} {:>6}ms  {}",
                        record.step, record.status, record.duration_ms, record.detail
                    );
                }
                if let Some(error) = &summary.error {
                    println!("  error: {error}");
                }
            }
            None => println!("No run recorded at {}", summary_path.display()),
        },
    }

    Ok(ExitCode::SUCCESS)
}
