//! Suggested-command execution
//!
//! Runs extractor output sequentially through the host shell, capturing
//! real exit code, stdout, stderr and duration. Results are returned
//! without reinterpretation. Only SuggestedCommand values can reach this
//! layer, so the extractor's allow-list is the execution boundary.
//!
//! No rollback, no dry-run diffing, no sandboxing - best effort by design.

use crate::error::{GrassAiError, Result};
use crate::extract::SuggestedCommand;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Maximum output length to capture per stream (prevent memory issues)
const MAX_OUTPUT_BYTES: usize = 64 * 1024;

/// How one command finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Exit code 0
    Success,
    /// Ran but returned non-zero
    NonZeroExit,
    /// Binary not found on the system
    CommandNotFound,
    /// Killed after exceeding the per-command timeout
    Timeout,
    /// Other OS error while spawning
    OsError,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NonZeroExit => "non-zero exit",
            Self::CommandNotFound => "command not found",
            Self::Timeout => "timeout",
            Self::OsError => "OS error",
        }
    }
}

/// Result of one executed command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stdout_truncated: bool,
    pub stderr: String,
    pub stderr_truncated: bool,
    pub duration_ms: u64,
    pub status: ExecutionStatus,
}

impl CommandOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == ExecutionStatus::Success
    }
}

/// Everything that happened during one execute pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub outcomes: Vec<CommandOutcome>,
    /// Commands skipped because an earlier one failed with stop_on_failure
    pub skipped: Vec<String>,
}

impl ExecutionReport {
    pub fn all_succeeded(&self) -> bool {
        self.skipped.is_empty() && self.outcomes.iter().all(|o| o.succeeded())
    }

    pub fn last_failure(&self) -> Option<&CommandOutcome> {
        self.outcomes.iter().rev().find(|o| !o.succeeded())
    }

    /// CommandFailed error for the last failed command, if any
    pub fn into_result(self) -> Result<ExecutionReport> {
        if let Some(failure) = self.last_failure() {
            return Err(GrassAiError::CommandFailed {
                command: failure.command.clone(),
                code: failure.exit_code,
            });
        }
        Ok(self)
    }
}

/// Sequential runner for suggested commands
pub struct CommandRunner {
    stop_on_failure: bool,
    command_timeout: Duration,
}

impl CommandRunner {
    pub fn new(stop_on_failure: bool, command_timeout: Duration) -> Self {
        Self {
            stop_on_failure,
            command_timeout,
        }
    }

    /// Run all commands in order. With stop_on_failure the remaining
    /// commands after a failure are reported as skipped, not run.
    pub async fn run_all(&self, commands: &[SuggestedCommand]) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        let mut aborted = false;

        for command in commands {
            if aborted {
                report.skipped.push(command.line.clone());
                continue;
            }

            tracing::info!("Executing suggested {} command: {}", command.kind.as_str(), command.line);
            let outcome = self.run_one(&command.line).await;

            if !outcome.succeeded() && self.stop_on_failure {
                aborted = true;
            }
            report.outcomes.push(outcome);
        }

        report
    }

    /// Execute one command line via the host shell.
    async fn run_one(&self, line: &str) -> CommandOutcome {
        let start = Instant::now();

        let output = tokio::time::timeout(
            self.command_timeout,
            Command::new("sh")
                .arg("-c")
                .arg(line)
                .kill_on_drop(true)
                .output(),
        )
        .await;

        let duration_ms = start.elapsed().as_millis() as u64;

        match output {
            Ok(Ok(output)) => {
                let (stdout, stdout_truncated) = truncate_output(&output.stdout);
                let (stderr, stderr_truncated) = truncate_output(&output.stderr);
                let exit_code = output.status.code().unwrap_or(-1);

                let status = if output.status.success() {
                    ExecutionStatus::Success
                } else if stderr.contains("command not found")
                    || stderr.contains("not found")
                {
                    ExecutionStatus::CommandNotFound
                } else {
                    ExecutionStatus::NonZeroExit
                };

                CommandOutcome {
                    command: line.to_string(),
                    exit_code,
                    stdout,
                    stdout_truncated,
                    stderr,
                    stderr_truncated,
                    duration_ms,
                    status,
                }
            }
            Ok(Err(e)) => CommandOutcome {
                command: line.to_string(),
                exit_code: -1,
                stdout: String::new(),
                stdout_truncated: false,
                stderr: format!("OS error: {}", e),
                stderr_truncated: false,
                duration_ms,
                status: ExecutionStatus::OsError,
            },
            Err(_) => CommandOutcome {
                command: line.to_string(),
                exit_code: -1,
                stdout: String::new(),
                stdout_truncated: false,
                stderr: format!(
                    "killed after {} seconds",
                    self.command_timeout.as_secs()
                ),
                stderr_truncated: false,
                duration_ms,
                status: ExecutionStatus::Timeout,
            },
        }
    }
}

/// Truncate captured output to MAX_OUTPUT_BYTES, converting to string.
fn truncate_output(bytes: &[u8]) -> (String, bool) {
    let truncated = bytes.len() > MAX_OUTPUT_BYTES;
    let slice = if truncated {
        &bytes[..MAX_OUTPUT_BYTES]
    } else {
        bytes
    };
    (String::from_utf8_lossy(slice).to_string(), truncated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::CommandKind;

    fn cmd(line: &str) -> SuggestedCommand {
        SuggestedCommand {
            line: line.to_string(),
            kind: CommandKind::SystemTool,
        }
    }

    fn runner(stop_on_failure: bool) -> CommandRunner {
        CommandRunner::new(stop_on_failure, Duration::from_secs(10))
    }

    #[tokio::test]
    async fn test_run_captures_stdout_and_exit_code() {
        let report = runner(true).run_all(&[cmd("echo grassai-ok")]).await;
        assert_eq!(report.outcomes.len(), 1);
        let outcome = &report.outcomes[0];
        assert!(outcome.succeeded());
        assert_eq!(outcome.exit_code, 0);
        assert!(outcome.stdout.contains("grassai-ok"));
        assert!(report.all_succeeded());
    }

    #[tokio::test]
    async fn test_commands_run_in_order() {
        let report = runner(true)
            .run_all(&[cmd("echo first"), cmd("echo second"), cmd("echo third")])
            .await;
        let outputs: Vec<&str> = report
            .outcomes
            .iter()
            .map(|o| o.stdout.trim())
            .collect();
        assert_eq!(outputs, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_stop_on_failure_skips_remaining() {
        let report = runner(true)
            .run_all(&[cmd("false"), cmd("echo never-runs")])
            .await;
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].status, ExecutionStatus::NonZeroExit);
        assert_eq!(report.skipped, vec!["echo never-runs".to_string()]);
        assert!(!report.all_succeeded());
    }

    #[tokio::test]
    async fn test_continue_past_failure_when_configured() {
        let report = runner(false)
            .run_all(&[cmd("false"), cmd("echo still-runs")])
            .await;
        assert_eq!(report.outcomes.len(), 2);
        assert!(report.skipped.is_empty());
        assert!(report.outcomes[1].stdout.contains("still-runs"));
    }

    #[tokio::test]
    async fn test_into_result_reports_last_failure() {
        let report = runner(false).run_all(&[cmd("sh -c 'exit 3'")]).await;
        let err = report.into_result().unwrap_err();
        match err {
            GrassAiError::CommandFailed { code, .. } => assert_eq!(code, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_kills_command() {
        let runner = CommandRunner::new(true, Duration::from_millis(200));
        let report = runner.run_all(&[cmd("sleep 5")]).await;
        assert_eq!(report.outcomes[0].status, ExecutionStatus::Timeout);
        assert!(report.outcomes[0].duration_ms < 5000);
    }

    #[tokio::test]
    async fn test_empty_command_list_is_trivially_successful() {
        let report = runner(true).run_all(&[]).await;
        assert!(report.outcomes.is_empty());
        assert!(report.all_succeeded());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_truncate_output() {
        let big = vec![b'x'; MAX_OUTPUT_BYTES + 100];
        let (text, truncated) = truncate_output(&big);
        assert!(truncated);
        assert_eq!(text.len(), MAX_OUTPUT_BYTES);

        let (text, truncated) = truncate_output(b"small");
        assert!(!truncated);
        assert_eq!(text, "small");
    }
}
