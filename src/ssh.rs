//! SSH reachability probe run before touching the repository.
//!
//! The probe logs into the backup server and immediately runs `exit`. Batch
//! mode stops `ssh` from prompting for a password, and the caller bounds
//! the whole attempt with a deadline.

use std::ffi::OsString;
use std::time::Duration;

/// Default deadline for the connectivity probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Describes one connectivity check against the backup server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConnectivityProbe {
    user: String,
    host: String,
    port: u16,
    timeout: Duration,
}

impl ConnectivityProbe {
    /// Creates a probe for `user@host:port` bounded by `timeout`.
    #[must_use]
    pub fn new(user: &str, host: &str, port: u16, timeout: Duration) -> Self {
        Self {
            user: user.to_owned(),
            host: host.to_owned(),
            port,
            timeout,
        }
    }

    /// Deadline applied to the whole probe.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `user@host` destination.
    #[must_use]
    pub fn target(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Arguments handed to the `ssh` client.
    #[must_use]
    pub fn args(&self) -> Vec<OsString> {
        let connect_timeout = self.timeout.as_secs().max(1);
        vec![
            OsString::from("-v"),
            OsString::from("-o"),
            OsString::from("BatchMode=yes"),
            OsString::from("-o"),
            OsString::from(format!("ConnectTimeout={connect_timeout}")),
            OsString::from("-p"),
            OsString::from(self.port.to_string()),
            OsString::from(self.target()),
            OsString::from("exit"),
        ]
    }
}
