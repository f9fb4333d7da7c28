//! Pipeline tests using the recording runner
//!
//! Real executables are stood in for by small shell scripts in temp
//! directories, so these tests are unix-only.
#![cfg(unix)]

use py_bootstrap::config::BootstrapConfig;
use py_bootstrap::env::SessionEnv;
use py_bootstrap::exec::{CommandOutput, RecordingRunner};
use py_bootstrap::report::StepStatus;
use py_bootstrap::steps::kernel::{self, KernelStatus};
use py_bootstrap::{BootstrapError, Context, EXIT_DESCRIPTOR_NOT_FOUND, Step};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INSTALLER_PATH: &str = "/uv/install.sh";

fn fake_executable(dir: &Path, name: &str) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

struct Project {
    temp: TempDir,
}

impl Project {
    fn new(with_descriptor: bool) -> Self {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("work")).unwrap();
        if with_descriptor {
            std::fs::write(
                temp.path().join("work/pyproject.toml"),
                "[project]\nname = \"demo\"\nversion = \"0.1.0\"\n",
            )
            .unwrap();
        }
        Self { temp }
    }

    fn workdir(&self) -> PathBuf {
        self.temp.path().join("work")
    }

    fn system_bin(&self) -> PathBuf {
        self.temp.path().join("system-bin")
    }

    fn installer_bin(&self) -> PathBuf {
        self.temp.path().join("home/.local/bin")
    }

    /// Session whose search path only holds `system-bin`
    fn env(&self) -> SessionEnv {
        std::fs::create_dir_all(self.system_bin()).unwrap();
        SessionEnv::new(vec![self.system_bin()], self.workdir())
            .with_home(self.temp.path().join("home"))
    }

    fn config(&self, server: &MockServer) -> BootstrapConfig {
        BootstrapConfig {
            installer_url: format!("{}{}", server.uri(), INSTALLER_PATH),
            ..Default::default()
        }
    }
}

async fn installer_server(expected_fetches: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(INSTALLER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("echo installing uv\n"))
        .expect(expected_fetches)
        .mount(&server)
        .await;
    server
}

/// Full run with the package manager already present
#[tokio::test]
async fn test_full_run_with_package_manager_present() {
    let project = Project::new(true);
    fake_executable(&project.system_bin(), "uv");
    let server = installer_server(0).await;

    let runner = Arc::new(RecordingRunner::new());
    let mut ctx = Context::new(project.config(&server), runner.clone(), project.env()).unwrap();
    let (summary, result) = py_bootstrap::run_all(&mut ctx).await;

    assert!(result.is_ok());
    assert!(summary.succeeded);
    assert!(!summary.installer_fetched);
    assert_eq!(summary.steps.len(), Step::ALL.len());
    assert!(summary.steps.iter().all(|s| s.status == StepStatus::Ok));

    assert_eq!(
        runner.command_lines(),
        vec![
            "uv pip install --upgrade pip",
            "uv pip install google-genai arxiv python-dotenv pytz",
            "uv pip install pytest ipykernel",
            "uv pip install -e .",
            "python -m ipykernel install --user --name code-agent --display-name 'Python (code-agent)'",
        ]
    );
}

/// Missing descriptor stops before any dependency is installed
#[tokio::test]
async fn test_missing_descriptor_aborts_with_dedicated_exit_code() {
    let project = Project::new(false);
    fake_executable(&project.system_bin(), "uv");
    let server = installer_server(0).await;

    let runner = Arc::new(RecordingRunner::new());
    let mut ctx = Context::new(project.config(&server), runner.clone(), project.env()).unwrap();
    let (summary, result) = py_bootstrap::run_all(&mut ctx).await;

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        BootstrapError::DescriptorNotFound(ref p) if p.ends_with("pyproject.toml")
    ));
    assert_eq!(err.exit_code(), EXIT_DESCRIPTOR_NOT_FOUND);

    // Only the pip upgrade ran
    assert_eq!(runner.command_lines(), vec!["uv pip install --upgrade pip"]);

    assert!(!summary.succeeded);
    let last = summary.steps.last().unwrap();
    assert_eq!(last.step, "dependencies");
    assert_eq!(last.status, StepStatus::Failed);
    assert!(last.detail.contains("not found"));
}

/// Missing package manager triggers the installer and extends the search path
#[tokio::test]
async fn test_missing_package_manager_runs_installer() {
    let project = Project::new(true);
    // The installer "drops" uv into ~/.local/bin, outside the initial search path
    fake_executable(&project.installer_bin(), "uv");
    let server = installer_server(1).await;

    let runner = Arc::new(RecordingRunner::new());
    let mut ctx = Context::new(project.config(&server), runner.clone(), project.env()).unwrap();
    let (summary, result) = py_bootstrap::run_all(&mut ctx).await;

    assert!(result.is_ok(), "{result:?}");
    assert!(summary.installer_fetched);
    assert_eq!(ctx.env.search_path()[0], project.installer_bin());
    assert_eq!(
        ctx.env.search_path()[1],
        project.temp.path().join("home/.cargo/bin")
    );

    let calls = runner.calls();
    assert_eq!(calls[0].program, "sh");
    assert_eq!(calls[0].stdin.as_deref(), Some(b"echo installing uv\n".as_slice()));
    assert_eq!(calls[1].program, "uv");
}

/// Installer runs but the tool is still not resolvable
#[tokio::test]
async fn test_package_manager_still_missing_after_installer() {
    let project = Project::new(true);
    let server = installer_server(1).await;

    let runner = Arc::new(RecordingRunner::new());
    let mut ctx = Context::new(project.config(&server), runner.clone(), project.env()).unwrap();
    let (_, result) = py_bootstrap::run_all(&mut ctx).await;

    assert!(matches!(
        result,
        Err(BootstrapError::PackageManagerUnavailable(ref name)) if name == "uv"
    ));
    assert_eq!(runner.calls().len(), 1);
}

/// A failing installer script aborts the run
#[tokio::test]
async fn test_failing_installer_aborts() {
    let project = Project::new(true);
    let server = installer_server(1).await;

    let runner = Arc::new(RecordingRunner::new().failing("sh", None));
    let mut ctx = Context::new(project.config(&server), runner.clone(), project.env()).unwrap();
    let (summary, result) = py_bootstrap::run_all(&mut ctx).await;

    assert!(matches!(
        result,
        Err(BootstrapError::CommandFailed { ref program, .. }) if program == "sh"
    ));
    assert_eq!(summary.steps.len(), 1);
    // The script was downloaded even though running it failed
    assert!(summary.installer_fetched);
}

/// A failed download leaves nothing fetched and runs nothing
#[tokio::test]
async fn test_installer_download_failure_aborts() {
    let project = Project::new(true);
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(INSTALLER_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let runner = Arc::new(RecordingRunner::new());
    let mut ctx = Context::new(project.config(&server), runner.clone(), project.env()).unwrap();
    let (summary, result) = py_bootstrap::run_all(&mut ctx).await;

    assert!(matches!(result, Err(BootstrapError::Installer(_))));
    assert!(!summary.installer_fetched);
    assert!(runner.calls().is_empty());
}

/// A failing command stops the pipeline at that step
#[tokio::test]
async fn test_command_failure_is_fail_fast() {
    let project = Project::new(true);
    fake_executable(&project.system_bin(), "uv");
    let server = installer_server(0).await;

    let runner = Arc::new(RecordingRunner::new().failing("uv", Some("-e")));
    let mut ctx = Context::new(project.config(&server), runner.clone(), project.env()).unwrap();
    let (summary, result) = py_bootstrap::run_all(&mut ctx).await;

    assert!(matches!(result, Err(BootstrapError::CommandFailed { code: 1, .. })));
    assert_eq!(summary.steps.last().unwrap().step, "editable");
    assert!(!runner.command_lines().iter().any(|l| l.contains("ipykernel install")));
}

/// Running twice on a provisioned environment succeeds both times
#[tokio::test]
async fn test_rerun_is_idempotent() {
    let project = Project::new(true);
    fake_executable(&project.installer_bin(), "uv");
    let server = installer_server(1).await;
    let runner = Arc::new(RecordingRunner::new());

    let mut first = Context::new(project.config(&server), runner.clone(), project.env()).unwrap();
    let (summary, result) = py_bootstrap::run_all(&mut first).await;
    assert!(result.is_ok());
    assert!(summary.installer_fetched);

    // The second session starts from the extended search path of the first
    let mut second =
        Context::new(project.config(&server), runner.clone(), first.env.clone()).unwrap();
    let (summary, result) = py_bootstrap::run_all(&mut second).await;
    assert!(result.is_ok());
    assert!(!summary.installer_fetched);
}

/// Kernel check after a run reports the registered kernel
#[tokio::test]
async fn test_kernel_check_after_run() {
    let project = Project::new(true);
    let listing = r#"{"kernelspecs": {"code-agent": {
        "resource_dir": "/k",
        "spec": {"display_name": "Python (code-agent)"}
    }}}"#;
    let runner = RecordingRunner::new().with_output(
        "python",
        Some("kernelspec"),
        CommandOutput::with_stdout(listing),
    );
    let config = BootstrapConfig::default();

    let status = kernel::check(&runner, &project.env(), &config).await.unwrap();
    assert_eq!(status, KernelStatus::Registered);
    assert_eq!(
        runner.command_lines(),
        vec!["python -m jupyter kernelspec list --json"]
    );
}

#[tokio::test]
async fn test_kernel_check_propagates_listing_failure() {
    let project = Project::new(true);
    let runner = RecordingRunner::new().failing("python", Some("kernelspec"));

    let result = kernel::check(&runner, &project.env(), &BootstrapConfig::default()).await;
    assert!(matches!(result, Err(BootstrapError::CommandFailed { .. })));
}
