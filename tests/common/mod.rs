//! Shared fixtures for integration tests.

use std::fs;

use camino::Utf8PathBuf;
use tempfile::TempDir;

/// Temporary job directory holding a configuration file and manifest.
///
/// The configuration sits at the top of the directory, so its parent is the
/// job root.
pub struct JobDir {
    _dir: TempDir,
    /// Path of the YAML backup configuration.
    pub config_path: Utf8PathBuf,
}

impl JobDir {
    /// Writes a complete configuration and a two-line manifest.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir");
        let manifest_path = root.join("daily.fofn");
        fs::write(&manifest_path, "/tmp/123.txt\n/home/user/smth.dat\n").expect("write manifest");

        let config_path = root.join("borgbecue.yaml");
        fs::write(
            &config_path,
            format!(
                "user: test\npassphrase: secret\nmanifest: {manifest_path}\nserver:\n  ip: 1.2.3.4\n  port: 22\n  repository: /backups/test\nkeep:\n  daily: 7\n  weekly: 4\n  monthly: 6\n"
            ),
        )
        .expect("write config");

        Self {
            _dir: dir,
            config_path,
        }
    }
}
