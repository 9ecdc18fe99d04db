//! Orchestrates one backup run against a remote Borg repository.
//!
//! The run checks the local `borg` binary, loads the job configuration and
//! manifest, optionally probes SSH, makes sure the repository exists, and
//! then creates, prunes and compacts archives. Each step finishes before
//! the next starts and the first hard failure aborts the run.
//!
//! Borg writes its progress to stderr, so every stderr line is echoed to
//! the log whether or not the command succeeded. Exit code 1 is Borg's
//! "completed with warnings" and never aborts a run.

use std::ffi::OsString;

use camino::Utf8PathBuf;
use log::{debug, info, warn};

use crate::borg::{
    self, BorgOperation, Compression, CreateOptions, ExitClass, PASSPHRASE_ENV, REPO_ENV,
    RepositoryProbe,
};
use crate::command::{CommandEnv, CommandError, CommandOutput, CommandRunner, render_command};
use crate::config::BackupConfig;
use crate::manifest::PathManifest;
use crate::ssh::ConnectivityProbe;
use crate::tool_config::ToolConfig;

mod error;

pub use error::RunError;

/// Lifecycle stages of a run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RunStage {
    /// Nothing has happened yet.
    Uninitialised,
    /// Checking the executable, configuration, connectivity and repository.
    Checking,
    /// Creating a repository that did not exist.
    Initialising,
    /// The repository exists and archives can be written.
    Ready,
    /// Running `borg create`.
    BackingUp,
    /// Running `borg prune`.
    Pruning,
    /// Running `borg compact`.
    Compacting,
    /// Every step completed.
    Done,
    /// A step failed; the run was aborted.
    Failed,
}

/// Caller-supplied inputs for a run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunRequest {
    /// Path to the YAML backup configuration.
    pub config_path: Utf8PathBuf,
    /// Compression passed to `borg create`.
    pub compression: Compression,
}

impl RunRequest {
    /// Creates a request, deriving compression from optional caller input.
    #[must_use]
    pub fn new(config_path: impl Into<Utf8PathBuf>, compression: Option<&str>) -> Self {
        Self {
            config_path: config_path.into(),
            compression: Compression::from_input(compression),
        }
    }
}

/// Everything derived from configuration before Borg is contacted.
#[derive(Clone, Debug)]
pub struct BackupPlan {
    /// Loaded and validated job configuration.
    pub config: BackupConfig,
    /// Paths to archive.
    pub manifest: PathManifest,
    /// `ssh://` location of the repository.
    pub access_string: String,
    /// Compression passed to `borg create`.
    pub compression: Compression,
    /// Environment for Borg: the base environment plus repository secrets.
    pub env: CommandEnv,
}

/// How a step ended when it did not abort the run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StepOutcome {
    /// Exit code 0.
    Completed,
    /// Exit code 1; Borg reported warnings.
    CompletedWithWarnings,
    /// The step did not apply to the installed Borg.
    Skipped,
}

/// Report of a successful run.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RunSummary {
    /// Version string reported by `borg --version`.
    pub borg_version: String,
    /// Whether this run created the repository.
    pub created_repository: bool,
    /// Number of paths handed to `borg create`.
    pub archived_paths: usize,
    /// Steps that finished with warnings.
    pub warnings: Vec<BorgOperation>,
    /// Whether `borg compact` was skipped as unsupported.
    pub compact_skipped: bool,
}

impl RunSummary {
    fn record(&mut self, operation: BorgOperation, outcome: StepOutcome) {
        match outcome {
            StepOutcome::Completed => {}
            StepOutcome::CompletedWithWarnings => self.warnings.push(operation),
            StepOutcome::Skipped => {
                if operation == BorgOperation::Compact {
                    self.compact_skipped = true;
                }
            }
        }
    }
}

/// Sequences the Borg calls of a backup run through a [`CommandRunner`].
#[derive(Debug)]
pub struct BackupOrchestrator<R: CommandRunner> {
    tool: ToolConfig,
    runner: R,
    base_env: CommandEnv,
    stage: RunStage,
    repository_initialised: bool,
}

impl<R: CommandRunner> BackupOrchestrator<R> {
    /// Creates an orchestrator whose subprocesses inherit the current
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::ToolConfig`] when the tool settings are invalid.
    pub fn new(tool: ToolConfig, runner: R) -> Result<Self, RunError> {
        tool.validate()?;
        Ok(Self {
            tool,
            runner,
            base_env: CommandEnv::inherited(),
            stage: RunStage::Uninitialised,
            repository_initialised: false,
        })
    }

    /// Replaces the environment subprocesses start from.
    ///
    /// This is primarily used by tests to keep assertions independent of
    /// the ambient environment.
    #[must_use]
    pub fn with_base_env(mut self, env: CommandEnv) -> Self {
        self.base_env = env;
        self
    }

    /// Current lifecycle stage.
    #[must_use]
    pub const fn stage(&self) -> RunStage {
        self.stage
    }

    /// Whether the repository is known to exist.
    #[must_use]
    pub const fn is_repository_initialised(&self) -> bool {
        self.repository_initialised
    }

    /// Runs the full backup sequence.
    ///
    /// On error the orchestrator is left in [`RunStage::Failed`].
    ///
    /// # Errors
    ///
    /// Returns the [`RunError`] of the first step that failed.
    pub fn execute(&mut self, request: &RunRequest) -> Result<RunSummary, RunError> {
        let result = self.execute_steps(request);
        if let Err(ref err) = result {
            debug!("run aborted during {:?}: {err}", self.stage);
            self.enter(RunStage::Failed);
        }
        result
    }

    fn execute_steps(&mut self, request: &RunRequest) -> Result<RunSummary, RunError> {
        self.enter(RunStage::Checking);
        let mut summary = RunSummary {
            borg_version: self.check_executable()?,
            ..RunSummary::default()
        };

        let plan = self.prepare(request)?;
        summary.archived_paths = plan.manifest.len();
        self.check_connectivity(&plan)?;

        let label = plan.config.repository_label();
        self.repository_initialised = self.probe_repository(&plan)?;
        if self.repository_initialised {
            info!("Borg repo already initialised: '{label}'");
        } else {
            info!("Borg repo not initialised: '{label}'");
            self.enter(RunStage::Initialising);
            let outcome = self.init_repository(&plan)?;
            summary.record(BorgOperation::Init, outcome);
            summary.created_repository = true;
            self.repository_initialised = true;
            info!("successfully initialised new Borg repo: '{label}'");
        }
        self.enter(RunStage::Ready);

        self.enter(RunStage::BackingUp);
        info!("creating new archive");
        let outcome = self.create_archive(&plan)?;
        summary.record(BorgOperation::Create, outcome);

        self.enter(RunStage::Pruning);
        info!("pruning existing archives");
        let outcome = self.prune(&plan)?;
        summary.record(BorgOperation::Prune, outcome);

        self.enter(RunStage::Compacting);
        info!("compacting repository");
        let outcome = self.compact(&plan)?;
        summary.record(BorgOperation::Compact, outcome);

        self.enter(RunStage::Done);
        Ok(summary)
    }

    /// Confirms the local `borg` binary runs and returns its version.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::ExecutableNotFound`] when `borg --version` cannot
    /// be spawned or exits non-zero.
    pub fn check_executable(&self) -> Result<String, RunError> {
        let program = &self.tool.borg_bin;
        let args = borg::version_args();
        debug!("running {}", render_command(program, &args));

        let output = self
            .runner
            .run(program, &args, &self.base_env)
            .map_err(|err| RunError::ExecutableNotFound {
                program: program.clone(),
                message: err.to_string(),
            })?;

        if !output.is_success() {
            return Err(RunError::ExecutableNotFound {
                program: program.clone(),
                message: format!(
                    "exit status {}: {}",
                    output.status_text(),
                    output.stderr.trim()
                ),
            });
        }

        let version = match output.stdout.trim() {
            "" => output.stderr.trim().to_owned(),
            stdout => stdout.to_owned(),
        };
        info!("found local Borg executable ({version})");
        Ok(version)
    }

    /// Loads configuration and manifest and derives the Borg environment.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Config`] or [`RunError::Manifest`] when either
    /// file is unreadable, malformed or incomplete.
    pub fn prepare(&self, request: &RunRequest) -> Result<BackupPlan, RunError> {
        let config = BackupConfig::load(&request.config_path)?;
        config.validate()?;
        info!("parsed configuration file: '{}'", request.config_path);

        let access_string = config.access_string();
        let env = self
            .base_env
            .with_var(REPO_ENV, &access_string)
            .with_var(PASSPHRASE_ENV, &config.passphrase);
        debug!("built SSH access string");

        let manifest = PathManifest::load(&config.manifest)?;
        info!(
            "loaded path manifest ({} paths): '{}'",
            manifest.len(),
            manifest.source()
        );

        Ok(BackupPlan {
            config,
            manifest,
            access_string,
            compression: request.compression.clone(),
            env,
        })
    }

    /// Probes SSH connectivity to the backup server, unless disabled.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Connectivity`] when `ssh` fails, cannot start, or
    /// exceeds the probe deadline. Its stderr is logged line by line first.
    pub fn check_connectivity(&self, plan: &BackupPlan) -> Result<(), RunError> {
        if !self.tool.check_ssh {
            info!("skipping SSH connectivity check");
            return Ok(());
        }

        let probe = ConnectivityProbe::new(
            &plan.config.user,
            &plan.config.server.ip,
            plan.config.server.port,
            self.tool.ssh_timeout(),
        );
        let target = probe.target();
        info!("checking SSH connection to '{target}'");

        let args = probe.args();
        debug!("running {}", render_command(&self.tool.ssh_bin, &args));
        let output = self
            .runner
            .run_with_timeout(&self.tool.ssh_bin, &args, &self.base_env, probe.timeout())
            .map_err(|err| RunError::Connectivity {
                target: target.clone(),
                message: err.to_string(),
            })?;

        if output.is_success() {
            return Ok(());
        }

        for line in output.stderr_lines() {
            warn!("ssh: {line}");
        }
        Err(RunError::Connectivity {
            target,
            message: format!("ssh exited with status {}", output.status_text()),
        })
    }

    /// Runs `borg info` and reports whether the repository exists.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::RepositoryState`] when Borg fails for a reason
    /// other than a missing repository.
    pub fn probe_repository(&self, plan: &BackupPlan) -> Result<bool, RunError> {
        let output = self
            .run_borg(BorgOperation::Info, &borg::info_args(), &plan.env)
            .map_err(|err| RunError::RepositoryState {
                status: String::from("not started"),
                stderr: err.to_string(),
            })?;

        echo_stderr(BorgOperation::Info, &output);
        match borg::classify_info(&output) {
            RepositoryProbe::Initialised => Ok(true),
            RepositoryProbe::Missing => Ok(false),
            RepositoryProbe::Unexpected => {
                debug!("repository location: {}", plan.access_string);
                Err(RunError::RepositoryState {
                    status: output.status_text(),
                    stderr: output.stderr.trim().to_owned(),
                })
            }
        }
    }

    /// Runs `borg init` with the configured encryption mode.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Subprocess`] when Borg fails.
    pub fn init_repository(&self, plan: &BackupPlan) -> Result<StepOutcome, RunError> {
        self.run_step(
            BorgOperation::Init,
            &borg::init_args(&self.tool.encryption),
            &plan.env,
        )
    }

    /// Runs `borg create` over every manifest path.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Subprocess`] when Borg fails.
    pub fn create_archive(&self, plan: &BackupPlan) -> Result<StepOutcome, RunError> {
        let options = CreateOptions {
            compression: plan.compression.clone(),
            exclude_cache_dirs: self.tool.exclude_cache_dirs,
            ..CreateOptions::default()
        };
        self.run_step(
            BorgOperation::Create,
            &borg::create_args(&options, plan.manifest.paths()),
            &plan.env,
        )
    }

    /// Runs `borg prune` with the configured retention counts.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Subprocess`] when Borg fails with a status other
    /// than 1.
    pub fn prune(&self, plan: &BackupPlan) -> Result<StepOutcome, RunError> {
        self.run_step(
            BorgOperation::Prune,
            &borg::prune_args(&plan.config.keep),
            &plan.env,
        )
    }

    /// Runs `borg compact`, skipping it when the installed Borg lacks it.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Subprocess`] when Borg fails with a status other
    /// than 1.
    pub fn compact(&self, plan: &BackupPlan) -> Result<StepOutcome, RunError> {
        let operation = BorgOperation::Compact;
        let output = self
            .run_borg(operation, &borg::compact_args(), &plan.env)
            .map_err(|err| spawn_failure(operation, &err))?;

        if borg::compact_unsupported(&output) {
            info!("available Borg version does not support 'borg compact', skipping command");
            return Ok(StepOutcome::Skipped);
        }

        settle(operation, &output)
    }

    fn run_step(
        &self,
        operation: BorgOperation,
        args: &[OsString],
        env: &CommandEnv,
    ) -> Result<StepOutcome, RunError> {
        let output = self
            .run_borg(operation, args, env)
            .map_err(|err| spawn_failure(operation, &err))?;
        settle(operation, &output)
    }

    fn run_borg(
        &self,
        operation: BorgOperation,
        args: &[OsString],
        env: &CommandEnv,
    ) -> Result<CommandOutput, CommandError> {
        debug!(
            "{operation}: running {}",
            render_command(&self.tool.borg_bin, args)
        );
        self.runner.run(&self.tool.borg_bin, args, env)
    }

    fn enter(&mut self, stage: RunStage) {
        debug!("stage {:?} -> {stage:?}", self.stage);
        self.stage = stage;
    }
}

fn settle(operation: BorgOperation, output: &CommandOutput) -> Result<StepOutcome, RunError> {
    echo_stderr(operation, output);

    match borg::classify_exit(output) {
        ExitClass::Success => Ok(StepOutcome::Completed),
        ExitClass::Warning => {
            warn!(
                "warnings while running `{operation}` (exit status {})",
                output.status_text()
            );
            Ok(StepOutcome::CompletedWithWarnings)
        }
        ExitClass::Failure => Err(RunError::Subprocess {
            operation,
            status: output.status_text(),
            stderr: output.stderr.trim().to_owned(),
        }),
    }
}

fn spawn_failure(operation: BorgOperation, err: &CommandError) -> RunError {
    RunError::Subprocess {
        operation,
        status: String::from("not started"),
        stderr: err.to_string(),
    }
}

fn echo_stderr(operation: BorgOperation, output: &CommandOutput) {
    for line in output.stderr_lines() {
        info!("{operation}: {line}");
    }
}
