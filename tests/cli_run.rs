//! End-to-end run of the CLI against a stand-in `borg` script.

#![cfg(unix)]

mod common;

use std::fs;
use std::os::unix::fs::PermissionsExt;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;

use common::JobDir;

const FAKE_BORG: &str = r#"#!/bin/sh
echo "$1 $BORG_REPO" >> "$FAKE_BORG_LOG"
case "$1" in
  --version) echo "borg 1.2.8" ;;
  info) echo "Repository $BORG_REPO does not exist." >&2; exit 2 ;;
  prune) echo "Warning: nothing to prune" >&2; exit 1 ;;
esac
exit 0
"#;

#[test]
fn full_run_initialises_repository_and_tolerates_warnings() {
    let job = JobDir::new();
    let root = job.config_path.parent().expect("job directory");
    let borg = root.join("borg");
    fs::write(&borg, FAKE_BORG).expect("write fake borg");
    fs::set_permissions(&borg, fs::Permissions::from_mode(0o755)).expect("chmod fake borg");
    let log = root.join("borg.log");

    let mut cmd = cargo_bin_cmd!("borgbecue");
    cmd.current_dir(root)
        .env("BORGBECUE_BORG_BIN", borg.as_str())
        .env("FAKE_BORG_LOG", log.as_str())
        .env("RUST_LOG", "info")
        .args(["--config", job.config_path.as_str(), "--skip-ssh-check"]);

    cmd.assert()
        .success()
        .stderr(contains("found local Borg executable (borg 1.2.8)"))
        .stderr(contains("successfully initialised new Borg repo"))
        .stderr(contains("borg prune: Warning: nothing to prune"));

    let calls = fs::read_to_string(&log).expect("read fake borg log");
    let repo = "ssh://test@1.2.3.4:22/backups/test";
    let expected: Vec<String> = ["info", "init", "create", "prune", "compact"]
        .iter()
        .map(|sub| format!("{sub} {repo}"))
        .collect();
    let mut lines = calls.lines().map(str::trim);
    assert_eq!(lines.next(), Some("--version"));
    assert_eq!(lines.collect::<Vec<_>>(), expected);
}
