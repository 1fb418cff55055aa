//! CLI argument building and subprocess execution.

use async_trait::async_trait;
use nocturne_core::error::{NocturneError, Result};
use nocturne_core::traits::{Agent, SessionMode};
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Bound on a single agent invocation.
const INVOCATION_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Runs the `claude` CLI once per wakeup, carrying the night's session
/// across invocations via `--session-id` (new) and `--resume` (continue).
pub struct ClaudeCli {
    binary: String,
    working_dir: PathBuf,
    timeout: Duration,
}

impl ClaudeCli {
    pub fn new(binary: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            working_dir: working_dir.into(),
            timeout: INVOCATION_TIMEOUT,
        }
    }

    /// Probe whether the configured binary answers `--version`.
    ///
    /// Runs without the working directory so a missing workspace does not
    /// mask a present CLI.
    pub async fn check_cli(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Build the CLI argument list for one invocation.
    ///
    /// Extracted as a pure function so the session-directive wiring is
    /// testable without subprocess execution. Returns the arguments
    /// excluding the binary name.
    fn build_invoke_args(mode: SessionMode<'_>, prompt: &str) -> Vec<String> {
        let mut args = Vec::new();
        match mode {
            SessionMode::Start(id) => {
                args.push("--session-id".to_string());
                args.push(id.to_string());
            }
            SessionMode::Resume(id) => {
                args.push("--resume".to_string());
                args.push(id.to_string());
            }
        }
        args.push("--print".to_string());
        args.push(prompt.to_string());
        args
    }

    /// Build the base `Command` with working directory and environment.
    fn base_command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.current_dir(&self.working_dir);
        // Remove CLAUDECODE so the CLI doesn't think it's nested.
        cmd.env_remove("CLAUDECODE");
        // A timed-out invocation must not outlive its wakeup.
        cmd.kill_on_drop(true);
        cmd
    }

    /// Execute a command with the configured timeout and standard error handling.
    async fn execute_with_timeout(
        &self,
        mut cmd: Command,
        label: &str,
    ) -> Result<std::process::Output> {
        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                NocturneError::Agent(format!(
                    "{label} timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| NocturneError::Agent(format!("failed to run {label}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NocturneError::Agent(format!(
                "{label} exited with {}: {stderr}",
                output.status
            )));
        }

        Ok(output)
    }
}

#[async_trait]
impl Agent for ClaudeCli {
    async fn invoke(&self, mode: SessionMode<'_>, prompt: &str) -> Result<String> {
        let mut cmd = self.base_command();
        cmd.args(Self::build_invoke_args(mode, prompt));

        let flag = match mode {
            SessionMode::Start(_) => "--session-id",
            SessionMode::Resume(_) => "--resume",
        };
        debug!("executing: {} {flag} <id> --print <prompt>", self.binary);

        let output = self.execute_with_timeout(cmd, "claude CLI").await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
