//! `wdog_simp`: minimal watchdog example.
//!
//! Starts the watchdog and triggers it every 100 ms until a key is
//! pressed, then stops triggering and waits long enough for the watchdog
//! to reset the system.

use std::ffi::OsString;
use std::process::ExitCode;

use clap::Parser;
use wdog_core::trigger::{LoopIo, TriggerLoop};
use wdog_core::{ProgressStyle, TriggerConfig};

use crate::error::{CliError, EXIT_PARAM};
use crate::parse_args;
use crate::session::{ToolEnv, close_device, open_device};

/// Trigger interval in milliseconds.
pub const TRIGGER_MS: u32 = 100;

/// Delay after the last trigger, longer than any sane watchdog time.
pub const FORCE_RESET_DELAY_MS: u64 = 10_000;

/// Command line of `wdog_simp`.
#[derive(Debug, Parser)]
#[command(name = "wdog_simp")]
#[command(about = "Example for Watchdog drivers: start watchdog and trigger it \
                   every 100msec until keypress. STOPPING THE TRIGGER WILL RESET YOUR SYSTEM")]
pub struct SimpArgs {
    /// Device name
    pub device: String,
}

/// Parse `args` and run the tool against the system environment.
///
/// Exits with 1 for bad arguments or a failed open, 0 otherwise.
pub fn main_entry<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = match parse_args::<SimpArgs, _, _>(args) {
        Ok(args) => args,
        Err(code) => return code,
    };
    crate::session::with_system_env(|env| match run(&args, env) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::from(EXIT_PARAM),
    })
}

/// Run `wdog_simp`.
///
/// Driver failures after the open are printed but do not fail the run.
///
/// # Errors
///
/// Returns an error if the device cannot be opened.
pub fn run(args: &SimpArgs, env: &mut ToolEnv<'_>) -> Result<(), CliError> {
    let device = open_device(env, &args.device)?;

    let config = TriggerConfig::builder()
        .interval_ms(TRIGGER_MS)
        .style(ProgressStyle::Counter {
            prompt: "Press any key to stop the trigger",
        })
        .build()?;
    let mut trigger = TriggerLoop::new(&*device, config);

    match trigger.start(env.out) {
        Err(err) => env.report(&err),
        Ok(()) => {
            let mut io = LoopIo {
                clock: &*env.clock,
                keys: &mut *env.keys,
                out: &mut *env.out,
            };
            let outcome = trigger.run_passes(&mut io);
            match outcome.error {
                Some(err) => env.report(&err),
                None => {
                    tracing::warn!(
                        delay_ms = FORCE_RESET_DELAY_MS,
                        "trigger stopped, waiting for the watchdog to reset the system"
                    );
                    env.clock.delay(FORCE_RESET_DELAY_MS);
                }
            }
        }
    }

    if let Err(err) = close_device(env, &*device) {
        tracing::debug!(error = %err, "close failed");
    }
    Ok(())
}
