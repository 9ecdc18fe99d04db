//! Borg command lines and interpretation of Borg's results.
//!
//! Argument vectors for each subcommand are assembled here so the
//! orchestrator never spells out flags itself. Everything that depends on
//! Borg's exit code conventions or its stderr wording lives in
//! [`classify`], keeping version drift a one-file fix.

use std::ffi::OsString;
use std::fmt;

use crate::config::RetentionConfig;

pub mod classify;

pub use classify::{
    ExitClass, RepositoryProbe, classify_exit, classify_info, compact_unsupported,
};

/// Environment variable Borg reads the repository location from.
pub const REPO_ENV: &str = "BORG_REPO";
/// Environment variable Borg reads the repository passphrase from.
pub const PASSPHRASE_ENV: &str = "BORG_PASSPHRASE";
/// Compression used when the caller does not pick one.
pub const DEFAULT_COMPRESSION: &str = "lz4";
/// Encryption mode used by `borg init`.
pub const DEFAULT_ENCRYPTION: &str = "keyfile";
/// Archive name template, expanded by Borg at creation time.
pub const ARCHIVE_NAME_TEMPLATE: &str = "::{hostname}-{now}";
/// Archive glob restricting pruning to this host's archives.
pub const PRUNE_GLOB: &str = "{hostname}-*";
/// Exclusion pattern applied to every archive.
pub const CACHE_DIR_PATTERN: &str = "*/.cache/*";

/// Borg subcommands issued during a run.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BorgOperation {
    /// `borg --version`
    Version,
    /// `borg info`
    Info,
    /// `borg init`
    Init,
    /// `borg create`
    Create,
    /// `borg prune`
    Prune,
    /// `borg compact`
    Compact,
}

impl BorgOperation {
    /// Label used as a prefix for echoed Borg output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Version => "borg --version",
            Self::Info => "borg info",
            Self::Init => "borg init",
            Self::Create => "borg create",
            Self::Prune => "borg prune",
            Self::Compact => "borg compact",
        }
    }
}

impl fmt::Display for BorgOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Compression algorithm passed to `borg create --compression`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Compression(String);

impl Compression {
    /// Derives the compression setting from caller input, falling back to
    /// [`DEFAULT_COMPRESSION`] when the input is absent or blank.
    #[must_use]
    pub fn from_input(input: Option<&str>) -> Self {
        match input.map(str::trim) {
            Some(value) if !value.is_empty() => Self(value.to_owned()),
            _ => Self(DEFAULT_COMPRESSION.to_owned()),
        }
    }

    /// Compression setting as handed to Borg.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Compression {
    fn default() -> Self {
        Self::from_input(None)
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Options shaping `borg create`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateOptions {
    /// Compression algorithm.
    pub compression: Compression,
    /// Skip directories tagged with `CACHEDIR.TAG` and `*/.cache/*`.
    pub exclude_cache_dirs: bool,
    /// Archive name template understood by Borg.
    pub archive_template: String,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            exclude_cache_dirs: true,
            archive_template: ARCHIVE_NAME_TEMPLATE.to_owned(),
        }
    }
}

/// Arguments for `borg --version`.
#[must_use]
pub fn version_args() -> Vec<OsString> {
    vec![OsString::from("--version")]
}

/// Arguments for `borg info`; the repository comes from `BORG_REPO`.
#[must_use]
pub fn info_args() -> Vec<OsString> {
    vec![OsString::from("info")]
}

/// Arguments for `borg init` with the given encryption mode.
#[must_use]
pub fn init_args(encryption: &str) -> Vec<OsString> {
    vec![
        OsString::from("init"),
        OsString::from(format!("--encryption={encryption}")),
    ]
}

/// Arguments for `borg create`, with every manifest path appended as a
/// positional argument after the archive name.
#[must_use]
pub fn create_args(options: &CreateOptions, paths: &[String]) -> Vec<OsString> {
    let mut args = vec![
        OsString::from("create"),
        OsString::from("--verbose"),
        OsString::from("--filter"),
        OsString::from("AMCE"),
        OsString::from("--list"),
        OsString::from("--stats"),
        OsString::from("--show-rc"),
        OsString::from("--compression"),
        OsString::from(options.compression.as_str()),
    ];

    if options.exclude_cache_dirs {
        args.push(OsString::from("--exclude-caches"));
        args.push(OsString::from("--exclude"));
        args.push(OsString::from(CACHE_DIR_PATTERN));
    }

    args.push(OsString::from(&options.archive_template));
    args.extend(paths.iter().map(OsString::from));
    args
}

/// Arguments for `borg prune` applying the retention counts.
#[must_use]
pub fn prune_args(keep: &RetentionConfig) -> Vec<OsString> {
    vec![
        OsString::from("prune"),
        OsString::from("--verbose"),
        OsString::from("--list"),
        OsString::from("--glob-archives"),
        OsString::from(PRUNE_GLOB),
        OsString::from("--show-rc"),
        OsString::from("--keep-daily"),
        OsString::from(keep.daily.to_string()),
        OsString::from("--keep-weekly"),
        OsString::from(keep.weekly.to_string()),
        OsString::from("--keep-monthly"),
        OsString::from(keep.monthly.to_string()),
    ]
}

/// Arguments for `borg compact`.
#[must_use]
pub fn compact_args() -> Vec<OsString> {
    vec![OsString::from("compact")]
}

#[cfg(test)]
mod tests;
