//! Core command types and the runner abstraction.

use std::ffi::OsString;
use std::process::{Command, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;

use super::env::CommandEnv;

/// Result of running an external command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandOutput {
    /// Exit code reported by the process, if available.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Returns `true` when the exit code equals zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.code, Some(0))
    }

    /// Human readable exit status, `unknown` when the process was signalled.
    #[must_use]
    pub fn status_text(&self) -> String {
        self.code
            .map_or_else(|| String::from("unknown"), |code| code.to_string())
    }

    /// Non-empty stderr lines in the order they were written.
    pub fn stderr_lines(&self) -> impl Iterator<Item = &str> {
        self.stderr.lines().filter(|line| !line.trim().is_empty())
    }
}

/// Errors raised before a command produced an exit status.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CommandError {
    /// Raised when a command cannot be spawned.
    #[error("failed to spawn {program}: {message}")]
    Spawn {
        /// Command that failed to start.
        program: String,
        /// Operating system error string.
        message: String,
    },
    /// Raised when a command outlives its deadline and is killed.
    #[error("{program} did not finish within {seconds} seconds")]
    Timeout {
        /// Command that was killed.
        program: String,
        /// Deadline that elapsed.
        seconds: u64,
    },
    /// Raised when the runtime driving a timed command cannot start.
    #[error("failed to start command runtime: {0}")]
    Runtime(String),
}

/// Abstraction over command execution to support fakes in tests.
pub trait CommandRunner {
    /// Runs `program` with the given arguments and environment, blocking
    /// until it exits and capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Spawn`] if the command cannot be started.
    fn run(
        &self,
        program: &str,
        args: &[OsString],
        env: &CommandEnv,
    ) -> Result<CommandOutput, CommandError>;

    /// Runs `program` like [`CommandRunner::run`] but kills it once
    /// `deadline` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Spawn`] if the command cannot be started and
    /// [`CommandError::Timeout`] when the deadline passes first.
    fn run_with_timeout(
        &self,
        program: &str,
        args: &[OsString],
        env: &CommandEnv,
        deadline: Duration,
    ) -> Result<CommandOutput, CommandError>;
}

/// Real command runner that shells out to the host operating system.
///
/// The child environment is cleared and replaced by the supplied
/// [`CommandEnv`], so callers decide exactly what a subprocess sees.
#[derive(Clone, Debug, Default)]
pub struct ProcessCommandRunner;

impl CommandRunner for ProcessCommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[OsString],
        env: &CommandEnv,
    ) -> Result<CommandOutput, CommandError> {
        let output = Command::new(program)
            .args(args)
            .env_clear()
            .envs(env.iter())
            .stdin(Stdio::null())
            .output()
            .map_err(|err| spawn_error(program, &err))?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn run_with_timeout(
        &self,
        program: &str,
        args: &[OsString],
        env: &CommandEnv,
        deadline: Duration,
    ) -> Result<CommandOutput, CommandError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| CommandError::Runtime(err.to_string()))?;

        runtime.block_on(async {
            let child = tokio::process::Command::new(program)
                .args(args)
                .env_clear()
                .envs(env.iter())
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output();

            match timeout(deadline, child).await {
                Ok(Ok(output)) => Ok(CommandOutput {
                    code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                }),
                Ok(Err(err)) => Err(spawn_error(program, &err)),
                Err(_) => Err(CommandError::Timeout {
                    program: program.to_owned(),
                    seconds: deadline.as_secs(),
                }),
            }
        })
    }
}

fn spawn_error(program: &str, err: &std::io::Error) -> CommandError {
    CommandError::Spawn {
        program: program.to_owned(),
        message: err.to_string(),
    }
}
