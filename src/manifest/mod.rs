//! Manifest of local paths handed to `borg create`.

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::fs::read_utf8_file;

/// Ordered list of filesystem paths to archive, one per manifest line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathManifest {
    source: Utf8PathBuf,
    paths: Vec<String>,
}

/// Errors raised while loading the manifest.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ManifestError {
    /// Raised when the manifest cannot be read.
    #[error("failed to read path manifest {path}: {message}")]
    Io {
        /// Manifest path that could not be read.
        path: Utf8PathBuf,
        /// Operating system error string.
        message: String,
    },
    /// Raised when the manifest lists no paths.
    #[error("path manifest {path} does not list any paths")]
    Empty {
        /// Manifest path that was empty.
        path: Utf8PathBuf,
    },
}

impl PathManifest {
    /// Reads the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Io`] when the file is unreadable and
    /// [`ManifestError::Empty`] when it contains no paths.
    pub fn load(path: &Utf8Path) -> Result<Self, ManifestError> {
        let contents = read_utf8_file(path).map_err(|err| ManifestError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::parse(path, &contents)
    }

    /// Splits manifest text into paths. Whitespace around the whole text and
    /// at the end of every line is trimmed, blank lines are skipped and
    /// order is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Empty`] when no paths remain.
    pub fn parse(source: &Utf8Path, contents: &str) -> Result<Self, ManifestError> {
        let paths: Vec<String> = contents
            .trim()
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim_start().is_empty())
            .map(ToOwned::to_owned)
            .collect();

        if paths.is_empty() {
            return Err(ManifestError::Empty {
                path: source.to_path_buf(),
            });
        }

        Ok(Self {
            source: source.to_path_buf(),
            paths,
        })
    }

    /// Paths in manifest order.
    #[must_use]
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// File the manifest was read from.
    #[must_use]
    pub fn source(&self) -> &Utf8Path {
        &self.source
    }

    /// Number of paths in the manifest.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns `true` when the manifest holds no paths.
    ///
    /// Pairs with [`PathManifest::len`]; a parsed manifest is never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests;
