//! External command execution
//!
//! Sync commands are plain shell strings (`git clone ...`, `git pull --rebase`)
//! executed through the host shell so the operator sees exactly what ran.

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command as AsyncCommand;
use tracing::{debug, warn};

use crate::error::{MirrorError, Result};
use crate::report::Reporter;

/// Exit code git uses for fatal errors such as "nothing to rebase onto"
pub const TOLERATED_EXIT_CODE: i32 = 128;

/// How a command finished when it did not fail the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command exited with status 0
    Success,
    /// The command failed with an exit code the caller chose to tolerate
    Tolerated(i32),
    /// There was nothing to run
    Skipped,
}

/// Runs one synchronization command in a working directory
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        command: &str,
        working_dir: &Path,
        stop_on_error: bool,
    ) -> Result<CommandOutcome>;
}

/// Decide whether an exit code fails the run
///
/// Exit 128 is tolerated unless `stop_on_error` is set; any other non-zero
/// code always fails.
pub fn classify_exit(command: &str, code: i32, stop_on_error: bool) -> Result<CommandOutcome> {
    match code {
        0 => Ok(CommandOutcome::Success),
        TOLERATED_EXIT_CODE if !stop_on_error => Ok(CommandOutcome::Tolerated(code)),
        _ => Err(MirrorError::CommandExecution {
            command: command.to_string(),
            code,
        }),
    }
}

/// [`CommandRunner`] that spawns the host shell
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    reporter: Reporter,
}

impl ShellRunner {
    pub fn new(reporter: Reporter) -> Self {
        Self { reporter }
    }

    fn shell_command(command: &str) -> AsyncCommand {
        #[cfg(windows)]
        {
            let mut cmd = AsyncCommand::new("cmd");
            cmd.args(["/C", command]);
            cmd
        }

        #[cfg(not(windows))]
        {
            let mut cmd = AsyncCommand::new("sh");
            cmd.args(["-c", command]);
            cmd
        }
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(
        &self,
        command: &str,
        working_dir: &Path,
        stop_on_error: bool,
    ) -> Result<CommandOutcome> {
        if command.trim().is_empty() {
            return Ok(CommandOutcome::Skipped);
        }

        self.reporter.command(command);
        debug!("Running `{}` in {}", command, working_dir.display());

        let status = Self::shell_command(command)
            .current_dir(working_dir)
            .status()
            .await
            .map_err(|e| MirrorError::io(working_dir, e))?;

        let Some(code) = status.code() else {
            return Err(MirrorError::CommandTerminated {
                command: command.to_string(),
            });
        };

        let outcome = classify_exit(command, code, stop_on_error)?;
        if let CommandOutcome::Tolerated(code) = outcome {
            warn!("Tolerating exit code {} from `{}`", code, command);
            self.reporter.alert(&format!("ERROR: {}", code));
        }

        Ok(outcome)
    }
}
