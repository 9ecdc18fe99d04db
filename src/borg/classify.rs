//! Interpretation of Borg exit codes and stderr text.
//!
//! Borg reserves exit code 1 for "finished with warnings" and uses 2 and
//! above for errors. Borg 1.4 can also report specific codes when
//! `BORG_EXIT_CODES=modern` is set; the repository probe recognises the
//! two that mean "no repository here".

use crate::command::CommandOutput;

const MISSING_REPOSITORY_MARKERS: [&str; 2] = ["does not exist", "is not a valid repository"];
const MODERN_MISSING_REPOSITORY_CODES: [i32; 2] = [13, 15];
const COMPACT_UNSUPPORTED_MARKER: &str = "invalid choice: 'compact'";

/// Outcome class of a Borg invocation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExitClass {
    /// Exit code 0.
    Success,
    /// Exit code 1: the command completed but reported warnings.
    Warning,
    /// Any other exit code, or termination by a signal.
    Failure,
}

impl ExitClass {
    /// Returns `true` unless the command failed outright.
    #[must_use]
    pub const fn is_completed(self) -> bool {
        !matches!(self, Self::Failure)
    }
}

/// What `borg info` revealed about the repository.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RepositoryProbe {
    /// The repository exists.
    Initialised,
    /// No repository exists at the configured location yet.
    Missing,
    /// Borg failed for some other reason.
    Unexpected,
}

/// Classifies an exit status using Borg's warning convention.
#[must_use]
pub const fn classify_exit(output: &CommandOutput) -> ExitClass {
    match output.code {
        Some(0) => ExitClass::Success,
        Some(1) => ExitClass::Warning,
        _ => ExitClass::Failure,
    }
}

/// Classifies the result of `borg info`.
///
/// Missing-repository markers are only consulted when the call failed; a
/// run that completed with warnings always means the repository exists.
#[must_use]
pub fn classify_info(output: &CommandOutput) -> RepositoryProbe {
    if reports_missing_repository(output) {
        return RepositoryProbe::Missing;
    }

    if classify_exit(output).is_completed() {
        RepositoryProbe::Initialised
    } else {
        RepositoryProbe::Unexpected
    }
}

/// Returns `true` when the installed Borg predates `borg compact`.
#[must_use]
pub fn compact_unsupported(output: &CommandOutput) -> bool {
    output.stderr.contains(COMPACT_UNSUPPORTED_MARKER)
}

fn reports_missing_repository(output: &CommandOutput) -> bool {
    if classify_exit(output).is_completed() {
        return false;
    }

    output
        .code
        .is_some_and(|code| MODERN_MISSING_REPOSITORY_CODES.contains(&code))
        || MISSING_REPOSITORY_MARKERS
            .iter()
            .any(|marker| output.stderr.contains(marker))
}
