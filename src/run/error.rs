//! Error types for the backup run.

use thiserror::Error;

use crate::borg::BorgOperation;
use crate::config::ConfigError;
use crate::manifest::ManifestError;
use crate::tool_config::ToolConfigError;

/// Errors that abort a backup run. None of them are retried.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RunError {
    /// Raised when tool settings are invalid.
    #[error("invalid tool settings: {0}")]
    ToolConfig(#[from] ToolConfigError),
    /// Raised when the backup configuration is unreadable, malformed or
    /// incomplete.
    #[error("error reading configuration file: {0}")]
    Config(#[from] ConfigError),
    /// Raised when the path manifest is unreadable or empty.
    #[error("error reading manifest file: {0}")]
    Manifest(#[from] ManifestError),
    /// Raised when the local `borg` executable is absent or unusable.
    #[error("could not access local Borg executable {program}: {message}")]
    ExecutableNotFound {
        /// Executable that was probed.
        program: String,
        /// Spawn error or captured stderr.
        message: String,
    },
    /// Raised when the SSH probe fails or times out.
    #[error("failed to establish an SSH connection to '{target}': {message}")]
    Connectivity {
        /// `user@host` that was probed.
        target: String,
        /// Exit status or timeout description.
        message: String,
    },
    /// Raised when `borg info` fails in a way that says nothing about
    /// whether the repository exists.
    #[error("unexpected error while running `borg info` (exit status {status}): {stderr}")]
    RepositoryState {
        /// Exit status as reported by the OS.
        status: String,
        /// Stderr captured from Borg.
        stderr: String,
    },
    /// Raised when `init`, `create`, `prune` or `compact` fails outright.
    #[error("`{operation}` failed (exit status {status}): {stderr}")]
    Subprocess {
        /// Borg subcommand that failed.
        operation: BorgOperation,
        /// Exit status as reported by the OS.
        status: String,
        /// Stderr captured from Borg, or the spawn error.
        stderr: String,
    },
}
