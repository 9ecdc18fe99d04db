//! Backup configuration loaded from the operator's YAML file.
//!
//! The file names the remote repository, the credentials used to reach it,
//! the manifest of local paths and the retention policy applied by
//! `borg prune`. Keys that are absent deserialise to empty or zero values;
//! [`BackupConfig::validate`] is the place that rejects them.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use thiserror::Error;

use crate::fs::read_utf8_file;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "borgbecue.yaml";

/// Settings describing one backup job.
#[derive(Clone, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct BackupConfig {
    /// Remote SSH user owning the repository.
    pub user: String,
    /// Passphrase protecting the repository key.
    pub passphrase: String,
    /// Path to the newline-delimited manifest of paths to archive.
    pub manifest: Utf8PathBuf,
    /// Remote endpoint hosting the repository.
    pub server: ServerConfig,
    /// Archive retention counts applied when pruning.
    pub keep: RetentionConfig,
}

/// Remote endpoint hosting the Borg repository.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Hostname or IP address of the backup server.
    pub ip: String,
    /// SSH port of the backup server.
    pub port: u16,
    /// Repository path on the backup server.
    pub repository: String,
}

/// Number of archives kept per period by `borg prune`.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct RetentionConfig {
    /// Daily archives to keep.
    pub daily: u32,
    /// Weekly archives to keep.
    pub weekly: u32,
    /// Monthly archives to keep.
    pub monthly: u32,
}

/// Errors raised while loading or validating the backup configuration.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Raised when the file cannot be read.
    #[error("failed to read configuration file {path}: {message}")]
    Io {
        /// Path that could not be read.
        path: Utf8PathBuf,
        /// Operating system error string.
        message: String,
    },
    /// Raised when the file is not valid YAML for this schema.
    #[error("failed to parse configuration file {path} as YAML: {message}")]
    Parse {
        /// Path that failed to parse.
        path: Utf8PathBuf,
        /// Parser error string.
        message: String,
    },
    /// Raised when a required key is empty or missing.
    #[error("missing {description}: set `{key}` in the configuration file")]
    MissingField {
        /// Human readable name of the setting.
        description: &'static str,
        /// Dotted YAML key of the setting.
        key: &'static str,
    },
}

impl BackupConfig {
    /// Reads and deserialises the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file is unreadable and
    /// [`ConfigError::Parse`] when it is not valid YAML for this schema.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = read_utf8_file(path).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_yaml(path, &contents)
    }

    /// Deserialises configuration from YAML text; `origin` is only used in
    /// error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text does not match the schema.
    pub fn from_yaml(origin: &Utf8Path, contents: &str) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(contents).map_err(|err| ConfigError::Parse {
            path: origin.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Ensures every setting needed to reach the repository is present.
    ///
    /// Retention counts are not checked; zero is a legitimate value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] for the first empty setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require(&self.user, "SSH user", "user")?;
        require(&self.passphrase, "repository passphrase", "passphrase")?;
        require(self.manifest.as_str(), "manifest path", "manifest")?;
        require(&self.server.ip, "backup server address", "server.ip")?;
        require(
            &self.server.repository,
            "repository path",
            "server.repository",
        )?;
        if self.server.port == 0 {
            return Err(ConfigError::MissingField {
                description: "backup server SSH port",
                key: "server.port",
            });
        }
        Ok(())
    }

    /// Builds the `ssh://` URL Borg uses to reach the repository.
    ///
    /// Leading slashes are stripped from the repository path so the URL
    /// never contains `//` after the port.
    ///
    /// # Examples
    ///
    /// ```
    /// # use borgbecue::config::{BackupConfig, ServerConfig};
    /// let config = BackupConfig {
    ///     user: String::from("test"),
    ///     server: ServerConfig {
    ///         ip: String::from("1.2.3.4"),
    ///         port: 22,
    ///         repository: String::from("/backups/test"),
    ///     },
    ///     ..BackupConfig::default()
    /// };
    /// assert_eq!(config.access_string(), "ssh://test@1.2.3.4:22/backups/test");
    /// ```
    #[must_use]
    pub fn access_string(&self) -> String {
        format!(
            "ssh://{}@{}:{}/{}",
            self.user,
            self.server.ip,
            self.server.port,
            self.server.repository.trim_start_matches('/'),
        )
    }

    /// `host:repository` label used in log messages.
    #[must_use]
    pub fn repository_label(&self) -> String {
        format!("{}:{}", self.server.ip, self.server.repository)
    }
}

impl fmt::Debug for BackupConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackupConfig")
            .field("user", &self.user)
            .field("passphrase", &"<redacted>")
            .field("manifest", &self.manifest)
            .field("server", &self.server)
            .field("keep", &self.keep)
            .finish()
    }
}

fn require(value: &str, description: &'static str, key: &'static str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField { description, key });
    }
    Ok(())
}
