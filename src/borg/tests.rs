//! Unit tests for Borg argument construction and result classification.

use std::ffi::OsString;

use rstest::rstest;

use super::*;
use crate::command::CommandOutput;
use crate::config::RetentionConfig;

fn strings(args: &[OsString]) -> Vec<String> {
    args.iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

fn output(code: Option<i32>, stderr: &str) -> CommandOutput {
    CommandOutput {
        code,
        stdout: String::new(),
        stderr: stderr.to_owned(),
    }
}

#[rstest]
#[case(None, "lz4")]
#[case(Some(""), "lz4")]
#[case(Some("   "), "lz4")]
#[case(Some("zstd,10"), "zstd,10")]
#[case(Some(" auto,lzma "), "auto,lzma")]
fn compression_defaults_to_lz4(#[case] input: Option<&str>, #[case] expected: &str) {
    assert_eq!(Compression::from_input(input).as_str(), expected);
}

#[test]
fn init_args_request_encryption_mode() {
    assert_eq!(
        strings(&init_args(DEFAULT_ENCRYPTION)),
        ["init", "--encryption=keyfile"]
    );
}

#[test]
fn create_args_append_paths_after_archive_name() {
    let options = CreateOptions {
        compression: Compression::from_input(Some("zstd")),
        ..CreateOptions::default()
    };
    let paths = vec![String::from("/etc"), String::from("/home/user")];

    let args = strings(&create_args(&options, &paths));

    assert_eq!(
        args,
        [
            "create",
            "--verbose",
            "--filter",
            "AMCE",
            "--list",
            "--stats",
            "--show-rc",
            "--compression",
            "zstd",
            "--exclude-caches",
            "--exclude",
            "*/.cache/*",
            "::{hostname}-{now}",
            "/etc",
            "/home/user",
        ]
    );
}

#[test]
fn create_args_can_skip_cache_exclusions() {
    let options = CreateOptions {
        exclude_cache_dirs: false,
        ..CreateOptions::default()
    };

    let args = strings(&create_args(&options, &[String::from("/srv")]));

    assert!(!args.iter().any(|arg| arg.starts_with("--exclude")), "{args:?}");
    assert_eq!(args.last().map(String::as_str), Some("/srv"));
}

#[test]
fn prune_args_carry_retention_counts() {
    let keep = RetentionConfig {
        daily: 7,
        weekly: 4,
        monthly: 12,
    };

    let args = strings(&prune_args(&keep));

    assert_eq!(
        args,
        [
            "prune",
            "--verbose",
            "--list",
            "--glob-archives",
            "{hostname}-*",
            "--show-rc",
            "--keep-daily",
            "7",
            "--keep-weekly",
            "4",
            "--keep-monthly",
            "12",
        ]
    );
}

#[test]
fn simple_subcommands() {
    assert_eq!(strings(&version_args()), ["--version"]);
    assert_eq!(strings(&info_args()), ["info"]);
    assert_eq!(strings(&compact_args()), ["compact"]);
}

#[rstest]
#[case(Some(0), ExitClass::Success)]
#[case(Some(1), ExitClass::Warning)]
#[case(Some(2), ExitClass::Failure)]
#[case(Some(127), ExitClass::Failure)]
#[case(None, ExitClass::Failure)]
fn exit_codes_follow_warning_convention(#[case] code: Option<i32>, #[case] expected: ExitClass) {
    assert_eq!(classify_exit(&output(code, "")), expected);
}

#[rstest]
#[case::success(Some(0), "", RepositoryProbe::Initialised)]
#[case::warning(Some(1), "some warning\n", RepositoryProbe::Initialised)]
#[case::warning_mentioning_missing_path(
    Some(1),
    "Warning: security dir /root/.config/borg/security/abc does not exist, creating\n",
    RepositoryProbe::Initialised
)]
#[case::missing(
    Some(2),
    "Repository ssh://test@1.2.3.4:22/backups/test does not exist.\n",
    RepositoryProbe::Missing
)]
#[case::invalid(
    Some(2),
    "/backups/test is not a valid repository. Check repo config.\n",
    RepositoryProbe::Missing
)]
#[case::modern_missing(Some(13), "", RepositoryProbe::Missing)]
#[case::modern_invalid(Some(15), "", RepositoryProbe::Missing)]
#[case::connection_closed(
    Some(2),
    "Connection closed by remote host. Is borg working on the server?\n",
    RepositoryProbe::Unexpected
)]
#[case::passphrase(Some(2), "passphrase supplied in BORG_PASSPHRASE is incorrect.\n", RepositoryProbe::Unexpected)]
#[case::signalled(None, "", RepositoryProbe::Unexpected)]
fn info_probe_classification(
    #[case] code: Option<i32>,
    #[case] stderr: &str,
    #[case] expected: RepositoryProbe,
) {
    assert_eq!(classify_info(&output(code, stderr)), expected);
}

#[rstest]
#[case("borg: error: argument <command>: invalid choice: 'compact' (choose from 'init', 'create')", true)]
#[case("compaction freed 12 MB\n", false)]
#[case("", false)]
fn compact_support_detection(#[case] stderr: &str, #[case] expected: bool) {
    assert_eq!(compact_unsupported(&output(Some(2), stderr)), expected);
}

#[test]
fn operation_labels_prefix_logs() {
    assert_eq!(BorgOperation::Create.to_string(), "borg create");
    assert_eq!(BorgOperation::Version.label(), "borg --version");
}
