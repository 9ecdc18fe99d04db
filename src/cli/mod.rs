//! Command-line interface definitions for the `borgbecue` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use camino::Utf8PathBuf;
use clap::Parser;

/// Top-level CLI for the `borgbecue` binary.
#[derive(Debug, Parser)]
#[command(
    name = "borgbecue",
    version,
    about = "Back up the paths listed in a manifest to a remote Borg repository"
)]
pub(crate) struct Cli {
    /// Path to the YAML backup configuration.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "PATH",
        default_value = "borgbecue.yaml"
    )]
    pub(crate) config: Utf8PathBuf,
    /// Compression algorithm handed to `borg create` (for example `lz4`,
    /// `zstd,3` or `none`).
    #[arg(
        short = 'z',
        long = "compression",
        value_name = "ALGO",
        default_value = "lz4"
    )]
    pub(crate) compression: String,
    /// Skip the SSH connectivity probe for this run.
    #[arg(long)]
    pub(crate) skip_ssh_check: bool,
}
