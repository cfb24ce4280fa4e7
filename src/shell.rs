//! Shell helpers shared by gate and agent subprocess adapters.
//!
//! Gates and agents are configured as shell command strings, so both go
//! through `sh -c`. Values interpolated into agent command templates are
//! escaped here to keep quoting consistent.

use camino::Utf8Path;
use std::process::Stdio;
use tokio::process::Command;

/// Escapes a value for safe inclusion in a POSIX shell command.
///
/// Uses single-quote wrapping and the standard `'\''` sequence for embedded
/// quotes.
#[must_use]
pub fn shell_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            escaped.push_str("'\\''");
        } else {
            escaped.push(ch);
        }
    }
    escaped.push('\'');
    escaped
}

/// Builds a `sh -c <script>` command rooted at `working_dir`.
///
/// Standard input is closed; callers choose where output goes.
#[must_use]
pub fn shell_command(script: &str, working_dir: &Utf8Path) -> Command {
    let mut command = Command::new("sh");
    command
        .arg("-c")
        .arg(script)
        .current_dir(working_dir.as_std_path())
        .stdin(Stdio::null())
        .kill_on_drop(true);
    command
}
