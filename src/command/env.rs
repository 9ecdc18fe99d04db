//! Explicit environment values handed to every subprocess.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fmt;

/// Environment variables passed to a subprocess.
///
/// The value is built once and shared by reference; adding a variable
/// produces a new value instead of touching the process environment.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct CommandEnv {
    vars: BTreeMap<OsString, OsString>,
}

impl CommandEnv {
    /// Creates an environment with no variables.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Snapshots the environment of the current process.
    #[must_use]
    pub fn inherited() -> Self {
        Self {
            vars: std::env::vars_os().collect(),
        }
    }

    /// Returns a copy of this environment with `key` set to `value`.
    #[must_use]
    pub fn with_var(&self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        let mut vars = self.vars.clone();
        vars.insert(key.into(), value.into());
        Self { vars }
    }

    /// Looks up a variable by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&OsStr> {
        self.vars.get(OsStr::new(key)).map(OsString::as_os_str)
    }

    /// Iterates over all variables in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars
            .iter()
            .map(|(key, value)| (key.as_os_str(), value.as_os_str()))
    }

    /// Number of variables carried by this environment.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns `true` when no variables are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

// Values may hold repository secrets, so only keys are printed.
impl fmt::Debug for CommandEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEnv")
            .field("keys", &self.vars.keys().collect::<Vec<_>>())
            .finish()
    }
}
