//! Binary entry point for the `borgbecue` CLI.

use std::process;

use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use thiserror::Error;

use borgbecue::{
    BackupOrchestrator, ProcessCommandRunner, RunError, RunRequest, RunSummary, ToolConfig,
};

mod cli;

use cli::Cli;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("backup failed: {0}")]
    Run(#[from] RunError),
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        error!("{err}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let tool = tool_config(cli)?;
    let request = RunRequest::new(cli.config.clone(), Some(&cli.compression));

    let mut orchestrator = BackupOrchestrator::new(tool, ProcessCommandRunner)?;
    let summary = orchestrator.execute(&request)?;
    report(&summary);
    Ok(())
}

fn tool_config(cli: &Cli) -> Result<ToolConfig, CliError> {
    let mut tool =
        ToolConfig::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))?;
    if cli.skip_ssh_check {
        tool.check_ssh = false;
    }
    Ok(tool)
}

fn report(summary: &RunSummary) {
    if summary.warnings.is_empty() {
        info!(
            "backup completed: {} paths archived",
            summary.archived_paths
        );
        return;
    }

    let steps: Vec<&str> = summary.warnings.iter().map(|op| op.label()).collect();
    warn!(
        "backup completed with warnings from {}: {} paths archived",
        steps.join(", "),
        summary.archived_paths
    );
}

#[cfg(test)]
mod tests {
    use borgbecue::config::DEFAULT_CONFIG_PATH;
    use camino::Utf8PathBuf;
    use rstest::rstest;

    use super::*;

    #[test]
    fn defaults_apply_without_flags() {
        let cli = Cli::try_parse_from(["borgbecue"]).expect("defaults should parse");

        assert_eq!(cli.config, Utf8PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(cli.compression, "lz4");
        assert!(!cli.skip_ssh_check);
    }

    #[rstest]
    #[case::short(["borgbecue", "-c", "/etc/backup.yaml", "-z", "zstd,3"])]
    #[case::long(["borgbecue", "--config", "/etc/backup.yaml", "--compression", "zstd,3"])]
    fn flags_override_defaults(#[case] args: [&str; 5]) {
        let cli = Cli::try_parse_from(args).expect("flags should parse");

        assert_eq!(cli.config, Utf8PathBuf::from("/etc/backup.yaml"));
        assert_eq!(cli.compression, "zstd,3");
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["borgbecue", "--bogus"]).is_err());
    }

    #[test]
    fn skip_ssh_check_flag_parses() {
        let cli =
            Cli::try_parse_from(["borgbecue", "--skip-ssh-check"]).expect("flag should parse");

        assert!(cli.skip_ssh_check);
    }

    #[test]
    fn run_error_converts_into_cli_error() {
        let err = CliError::from(RunError::Connectivity {
            target: String::from("test@1.2.3.4"),
            message: String::from("ssh exited with status 255"),
        });

        assert!(err.to_string().starts_with("backup failed: "), "{err}");
    }
}
