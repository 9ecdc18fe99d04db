//! Core library for the `borgbecue` backup runner.
//!
//! A run reads a YAML job description and a manifest of paths, then drives
//! the local `borg` binary through one backup cycle against a repository
//! reached over SSH: check the executable, probe connectivity, initialise
//! the repository if needed, create an archive, prune, compact.
//!
//! Every subprocess goes through the [`CommandRunner`] seam, so the whole
//! sequence can be exercised with [`test_support::ScriptedRunner`].

pub mod borg;
pub mod command;
pub mod config;
mod fs;
pub mod manifest;
pub mod run;
pub mod ssh;
pub mod test_support;
pub mod tool_config;

pub use borg::{BorgOperation, Compression, CreateOptions, ExitClass, RepositoryProbe};
pub use command::{
    CommandEnv, CommandError, CommandOutput, CommandRunner, ProcessCommandRunner, render_command,
};
pub use config::{BackupConfig, ConfigError, RetentionConfig, ServerConfig};
pub use manifest::{ManifestError, PathManifest};
pub use run::{
    BackupOrchestrator, BackupPlan, RunError, RunRequest, RunStage, RunSummary, StepOutcome,
};
pub use ssh::ConnectivityProbe;
pub use tool_config::{ToolConfig, ToolConfigError};
