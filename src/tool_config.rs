//! Settings for the local tooling, layered via `ortho-config`.
//!
//! These cover how `borgbecue` drives its helpers (which `borg` and `ssh`
//! binaries, whether to probe SSH first) rather than the backup job itself,
//! which lives in the YAML file handled by [`crate::config`]. Values merge
//! defaults, configuration files and `BORGBECUE_*` environment variables.

use std::ffi::OsString;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::borg::DEFAULT_ENCRYPTION;
use crate::ssh::DEFAULT_PROBE_TIMEOUT;

/// Binaries and switches used while running a backup.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "BORGBECUE")]
pub struct ToolConfig {
    /// Path to the `borg` executable.
    #[ortho_config(default = "borg".to_owned())]
    pub borg_bin: String,
    /// Path to the `ssh` executable used by the connectivity probe.
    #[ortho_config(default = "ssh".to_owned())]
    pub ssh_bin: String,
    /// Whether to probe SSH connectivity before contacting the repository.
    #[ortho_config(default = true)]
    pub check_ssh: bool,
    /// Deadline for the connectivity probe, in seconds.
    #[ortho_config(default = 5)]
    pub ssh_timeout_secs: u64,
    /// Encryption mode passed to `borg init`.
    #[ortho_config(default = DEFAULT_ENCRYPTION.to_owned())]
    pub encryption: String,
    /// Whether `borg create` skips cache directories.
    #[ortho_config(default = true)]
    pub exclude_cache_dirs: bool,
}

/// Errors raised while loading or validating tool settings.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ToolConfigError {
    /// Indicates that parsing or merging configuration layers failed.
    #[error("tool configuration parsing failed: {0}")]
    Parse(String),
    /// Raised when a required value is blank or out of range.
    #[error("invalid {field}: set BORGBECUE_{env_suffix}", env_suffix = field.to_uppercase())]
    Invalid {
        /// Setting that failed validation.
        field: String,
    },
}

impl ToolConfig {
    /// Built-in settings, identical to the layered defaults.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            borg_bin: String::from("borg"),
            ssh_bin: String::from("ssh"),
            check_ssh: true,
            ssh_timeout_secs: DEFAULT_PROBE_TIMEOUT.as_secs(),
            encryption: DEFAULT_ENCRYPTION.to_owned(),
            exclude_cache_dirs: true,
        }
    }

    /// Loads settings from defaults, configuration files and environment
    /// variables without parsing the process arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ToolConfigError::Parse`] when merging sources fails.
    pub fn load_without_cli_args() -> Result<Self, ToolConfigError> {
        Self::load_from_iter([OsString::from("borgbecue")])
            .map_err(|err| ToolConfigError::Parse(err.to_string()))
    }

    /// Ensures binaries are named and the probe deadline is non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`ToolConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ToolConfigError> {
        Self::require_value(&self.borg_bin, "borg_bin")?;
        Self::require_value(&self.ssh_bin, "ssh_bin")?;
        Self::require_value(&self.encryption, "encryption")?;
        if self.check_ssh && self.ssh_timeout_secs == 0 {
            return Err(ToolConfigError::Invalid {
                field: String::from("ssh_timeout_secs"),
            });
        }
        Ok(())
    }

    /// Deadline for the connectivity probe.
    #[must_use]
    pub const fn ssh_timeout(&self) -> Duration {
        Duration::from_secs(self.ssh_timeout_secs)
    }

    fn require_value(value: &str, field: &str) -> Result<(), ToolConfigError> {
        if value.trim().is_empty() {
            return Err(ToolConfigError::Invalid {
                field: field.to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = ToolConfig::standard();

        assert_eq!(cfg.borg_bin, "borg");
        assert_eq!(cfg.ssh_bin, "ssh");
        assert!(cfg.check_ssh);
        assert_eq!(cfg.ssh_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.encryption, "keyfile");
        assert!(cfg.validate().is_ok());
    }

    #[rstest]
    #[case::borg(|c: &mut ToolConfig| c.borg_bin = String::from(" "), "borg_bin")]
    #[case::ssh(|c: &mut ToolConfig| c.ssh_bin.clear(), "ssh_bin")]
    #[case::encryption(|c: &mut ToolConfig| c.encryption.clear(), "encryption")]
    #[case::timeout(|c: &mut ToolConfig| c.ssh_timeout_secs = 0, "ssh_timeout_secs")]
    fn validate_rejects_blank_settings(
        #[case] mutate: fn(&mut ToolConfig),
        #[case] field: &str,
    ) {
        let mut cfg = ToolConfig::standard();
        mutate(&mut cfg);

        let err = cfg.validate().expect_err("validation should fail");

        assert_eq!(
            err,
            ToolConfigError::Invalid {
                field: field.to_owned()
            }
        );
        assert!(
            err.to_string()
                .contains(&format!("BORGBECUE_{}", field.to_uppercase())),
            "{err}"
        );
    }

    #[test]
    fn zero_timeout_is_fine_when_probe_disabled() {
        let cfg = ToolConfig {
            check_ssh: false,
            ssh_timeout_secs: 0,
            ..ToolConfig::standard()
        };

        assert!(cfg.validate().is_ok());
    }
}
