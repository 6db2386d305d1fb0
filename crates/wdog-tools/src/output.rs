//! Console output for tool messages

use std::fmt::Display;
use std::io::Write;

use colored::Colorize;

/// Print an error line in the `*** <message>` format.
///
/// The marker is red only with `color` set; pass it only when `out` is a
/// terminal. Console failures are logged only, since the error being
/// reported is the more useful one.
pub fn print_error(out: &mut dyn Write, color: bool, error: &dyn Display) {
    let marker = if color {
        "***".red().bold()
    } else {
        "***".normal()
    };
    if let Err(err) = writeln!(out, "{marker} {error}") {
        tracing::warn!(error = %err, "failed to print error report");
    }
}

/// Print an informational line.
pub fn print_line(out: &mut dyn Write, line: &dyn Display) {
    if let Err(err) = writeln!(out, "{line}") {
        tracing::warn!(error = %err, "failed to print console line");
    }
}
