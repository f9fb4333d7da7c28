//! Command execution
//!
//! Steps describe the commands they need as [`CommandSpec`] values and hand
//! them to a [`CommandRunner`]. [`SystemRunner`] spawns real processes;
//! [`RecordingRunner`] records them and replays canned outputs for tests.

use crate::BootstrapError;
use crate::env::SessionEnv;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// A command to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Bytes written to the child's stdin, which is then closed
    pub stdin: Option<Vec<u8>>,
    pub envs: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Shell-like rendering for logs and `plan` output
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn quote(word: &str) -> String {
    if !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@+~".contains(c))
    {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            ..Default::default()
        }
    }

    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Executes commands on behalf of the steps
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion and capture its output.
    /// A non-zero exit is not an error at this level.
    async fn run(
        &self,
        spec: &CommandSpec,
        env: &SessionEnv,
    ) -> Result<CommandOutput, BootstrapError>;

    /// Run a command and turn a non-zero exit into [`BootstrapError::CommandFailed`]
    async fn run_checked(
        &self,
        spec: &CommandSpec,
        env: &SessionEnv,
    ) -> Result<CommandOutput, BootstrapError> {
        debug!("Running: {}", spec.display());
        let output = self.run(spec, env).await?;

        if !output.stdout.is_empty() {
            debug!("stdout: {}", output.stdout.trim_end());
        }

        if !output.is_success() {
            warn!(
                "Command exited with status {}: {}",
                output.code.unwrap_or(-1),
                output.stderr.trim_end()
            );
            return Err(BootstrapError::command_failed(
                &spec.program,
                output.code,
                output.stderr.trim_end(),
            ));
        }

        Ok(output)
    }
}

/// Spawns real processes with `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        spec: &CommandSpec,
        env: &SessionEnv,
    ) -> Result<CommandOutput, BootstrapError> {
        // Resolve against the session path, not the one this process started with
        let program = env
            .resolve(&spec.program)
            .map(|p| p.into_os_string())
            .unwrap_or_else(|| spec.program.clone().into());

        let mut command = tokio::process::Command::new(program);
        command
            .args(&spec.args)
            .current_dir(env.workdir())
            .env("PATH", env.path_var()?)
            .envs(spec.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = match &spec.stdin {
            Some(input) => {
                command.stdin(Stdio::piped());
                let mut child = command
                    .spawn()
                    .map_err(|e| BootstrapError::spawn(&spec.program, e))?;
                // Feed stdin while stdout/stderr are drained, or a chatty child
                // blocks on a full pipe while we block on its stdin
                let stdin = child.stdin.take();
                let feed = async move {
                    if let Some(mut stdin) = stdin {
                        stdin.write_all(input).await?;
                        // Dropping closes the pipe so the child sees EOF
                    }
                    Ok::<(), std::io::Error>(())
                };
                let (fed, output) = tokio::join!(feed, child.wait_with_output());
                let output = output?;
                match fed {
                    // Child exited before reading everything; its status decides
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                        debug!("{} closed stdin early", spec.program);
                    }
                    other => other?,
                }
                output
            }
            None => command
                .stdin(Stdio::null())
                .output()
                .await
                .map_err(|e| BootstrapError::spawn(&spec.program, e))?,
        };

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

struct Rule {
    program: String,
    arg: Option<String>,
    output: CommandOutput,
}

/// Records every command and answers with canned outputs
///
/// Commands without a matching rule succeed with empty output.
///
/// # Example
/// ```
/// use py_bootstrap::exec::{CommandOutput, RecordingRunner};
///
/// let runner = RecordingRunner::new()
///     .with_output("jupyter", Some("kernelspec"), CommandOutput::with_stdout("{}"))
///     .failing("uv", Some("-e"));
/// assert!(runner.calls().is_empty());
/// ```
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    rules: Vec<Rule>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `program` (optionally only when `arg` is among its arguments) with `output`
    pub fn with_output(mut self, program: &str, arg: Option<&str>, output: CommandOutput) -> Self {
        self.rules.push(Rule {
            program: program.to_string(),
            arg: arg.map(str::to_string),
            output,
        });
        self
    }

    /// Make matching commands exit with status 1
    pub fn failing(self, program: &str, arg: Option<&str>) -> Self {
        self.with_output(program, arg, CommandOutput::failure(1, "simulated failure"))
    }

    /// Commands seen so far, in execution order
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Rendered command lines seen so far
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(CommandSpec::display).collect()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(
        &self,
        spec: &CommandSpec,
        _env: &SessionEnv,
    ) -> Result<CommandOutput, BootstrapError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(spec.clone());
        }

        let output = self
            .rules
            .iter()
            .find(|rule| {
                rule.program == spec.program
                    && rule
                        .arg
                        .as_ref()
                        .is_none_or(|arg| spec.args.iter().any(|a| a == arg))
            })
            .map(|rule| rule.output.clone())
            .unwrap_or_else(CommandOutput::success);
        Ok(output)
    }
}
