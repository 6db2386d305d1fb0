//! WDOG profile watchdog command-line tools.
//!
//! Three binaries share this library:
//!
//! - `wdog_ctrl`: configure times, pins and interrupt handling, dump the
//!   status block and run a trigger loop.
//! - `wdog_simp`: start the watchdog, trigger until a key is pressed, then
//!   let the watchdog reset the system.
//! - `wdog_test`: query status, set the watchdog time, trigger, or ramp the
//!   trigger pause until the watchdog fires.
//!
//! Each tool is a [`clap`] parser plus a `run` function taking a
//! [`session::ToolEnv`], so tests can substitute the driver, clock, keys
//! and console.
//!
//! Diagnostics go through `tracing` to stderr and are filtered with the
//! `WDOG_LOG` environment variable.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    missing_docs,
    missing_debug_implementations
)]

pub mod ctrl;
pub mod error;
pub mod logging;
pub mod output;
pub mod session;
pub mod simp;
pub mod test_tool;

use std::ffi::OsString;
use std::process::ExitCode;

use crate::error::EXIT_PARAM;

/// Largest accepted time argument in milliseconds.
///
/// Times are handed to the driver in microseconds as an `i32`.
pub const MAX_TIME_MS: i64 = 2_147_483;

/// Parse a tool command line.
///
/// Help and usage errors are printed by clap.
///
/// # Errors
///
/// Returns exit code 1 when the command line is rejected or help was
/// requested.
pub fn parse_args<P, I, T>(args: I) -> Result<P, ExitCode>
where
    P: clap::Parser,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    P::try_parse_from(args).map_err(|err| {
        if let Err(io_err) = err.print() {
            tracing::warn!(error = %io_err, "failed to print usage");
        }
        ExitCode::from(EXIT_PARAM)
    })
}
