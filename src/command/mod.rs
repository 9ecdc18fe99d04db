//! Subprocess execution behind a mockable runner.
//!
//! Every external program (`borg`, `ssh`) is started through a
//! [`CommandRunner`], which receives an explicit [`CommandEnv`] instead of
//! inheriting whatever the process environment happens to hold. Tests swap
//! in a scripted runner so no real process is spawned.

use std::ffi::OsString;

use shell_escape::unix::escape;

mod env;
mod types;

pub use env::CommandEnv;
pub use types::{CommandError, CommandOutput, CommandRunner, ProcessCommandRunner};

/// Renders `program` and `args` as a shell-escaped command line for logs.
#[must_use]
pub fn render_command(program: &str, args: &[OsString]) -> String {
    let mut rendered = String::from(escape(program.into()));

    for arg in args {
        rendered.push(' ');
        let lossy = arg.to_string_lossy();
        rendered.push_str(escape(lossy).as_ref());
    }

    rendered
}
