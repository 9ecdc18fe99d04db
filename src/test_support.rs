//! Test support utilities shared across unit and integration tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::rc::Rc;
use std::time::Duration;

use crate::command::{CommandEnv, CommandError, CommandOutput, CommandRunner};

/// Scripted command runner that returns pre-seeded outputs in FIFO order.
///
/// Used to drive deterministic command outcomes without spawning processes.
/// Clones share the same queue and invocation log, so a test can keep one
/// handle while the orchestrator owns another.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRunner {
    responses: Rc<RefCell<VecDeque<Result<CommandOutput, CommandError>>>>,
    invocations: Rc<RefCell<Vec<CommandInvocation>>>,
}

/// Records a single invocation made through [`ScriptedRunner`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandInvocation {
    /// Program name as passed to the runner.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<OsString>,
    /// Environment handed to the program.
    pub env: CommandEnv,
    /// Deadline, when the call was bounded.
    pub timeout: Option<Duration>,
}

impl CommandInvocation {
    /// Returns a shell-like command string for assertions.
    #[must_use]
    pub fn command_string(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        parts.extend(
            self.args
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }

    /// First argument, which names the Borg subcommand.
    #[must_use]
    pub fn subcommand(&self) -> Option<String> {
        self.args
            .first()
            .map(|arg| arg.to_string_lossy().into_owned())
    }

    /// Looks up an environment variable passed with this invocation.
    #[must_use]
    pub fn env_var(&self, key: &str) -> Option<String> {
        self.env
            .get(key)
            .map(|value| value.to_string_lossy().into_owned())
    }
}

impl ScriptedRunner {
    /// Creates a new runner with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all invocations recorded so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<CommandInvocation> {
        self.invocations.borrow().clone()
    }

    /// Subcommands (first argument) of every invocation, in order.
    #[must_use]
    pub fn subcommands(&self) -> Vec<String> {
        self.invocations
            .borrow()
            .iter()
            .filter_map(CommandInvocation::subcommand)
            .collect()
    }

    /// Number of responses not yet consumed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.responses.borrow().len()
    }

    /// Pushes a successful exit status.
    pub fn push_success(&self) {
        self.push_output(Some(0), "", "");
    }

    /// Pushes a successful exit status with stdout text.
    pub fn push_stdout(&self, stdout: &str) {
        self.push_output(Some(0), stdout, "");
    }

    /// Pushes a specific exit code.
    pub fn push_exit_code(&self, code: i32) {
        self.push_output(Some(code), "", "");
    }

    /// Pushes an exit code with stderr text.
    pub fn push_stderr(&self, code: i32, stderr: &str) {
        self.push_output(Some(code), "", stderr);
    }

    /// Pushes a failing exit code with stderr text.
    pub fn push_failure(&self, code: i32) {
        self.push_stderr(code, "simulated failure");
    }

    /// Pushes a process that ended without an exit code.
    pub fn push_missing_exit_code(&self) {
        self.push_output(None, "", "");
    }

    /// Pushes a spawn failure, as if the program were not installed.
    pub fn push_spawn_error(&self, program: &str) {
        self.responses
            .borrow_mut()
            .push_back(Err(CommandError::Spawn {
                program: program.to_owned(),
                message: String::from("No such file or directory (os error 2)"),
            }));
    }

    /// Pushes a timeout for a bounded command.
    pub fn push_timeout(&self, program: &str, seconds: u64) {
        self.responses
            .borrow_mut()
            .push_back(Err(CommandError::Timeout {
                program: program.to_owned(),
                seconds,
            }));
    }

    fn push_output(&self, code: Option<i32>, stdout: &str, stderr: &str) {
        self.responses.borrow_mut().push_back(Ok(CommandOutput {
            code,
            stdout: stdout.to_owned(),
            stderr: stderr.to_owned(),
        }));
    }

    fn respond(
        &self,
        program: &str,
        args: &[OsString],
        env: &CommandEnv,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, CommandError> {
        self.invocations.borrow_mut().push(CommandInvocation {
            program: program.to_owned(),
            args: args.to_vec(),
            env: env.clone(),
            timeout,
        });

        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| {
                Err(CommandError::Spawn {
                    program: program.to_owned(),
                    message: String::from("no scripted response available"),
                })
            })
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(
        &self,
        program: &str,
        args: &[OsString],
        env: &CommandEnv,
    ) -> Result<CommandOutput, CommandError> {
        self.respond(program, args, env, None)
    }

    fn run_with_timeout(
        &self,
        program: &str,
        args: &[OsString],
        env: &CommandEnv,
        deadline: Duration,
    ) -> Result<CommandOutput, CommandError> {
        self.respond(program, args, env, Some(deadline))
    }
}
