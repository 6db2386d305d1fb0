//! `wdog_test`: configure and serve a watchdog.
//!
//! Runs the requested steps in the order status, shot, time get, time
//! set/stop, trigger loop, time ramp. The first driver failure is printed
//! and the remaining steps are skipped.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{ArgAction, ArgGroup, Parser};
use wdog_core::dump::{query_shot, query_status, query_time};
use wdog_core::ramp::run_time_ramp;
use wdog_core::{DriverOp, DriverResultExt, ProgressStyle, TriggerConfig, WdogError};
use wdog_driver::{StatusCode, WdogDevice};

use crate::error::{CliError, EXIT_PARAM};
use crate::session::{ToolEnv, close_device, drive_trigger_loop, open_device};
use crate::{MAX_TIME_MS, parse_args};

/// Command line of `wdog_test`.
#[derive(Debug, Parser)]
#[command(name = "wdog_test")]
#[command(about = "Configure and serve Watchdog")]
#[command(disable_help_flag = true)]
#[command(group(ArgGroup::new("action").required(true).multiple(true)))]
pub struct TestArgs {
    /// Device name
    pub device: String,

    /// Start watchdog and trigger all <msec>; a keypress aborts the
    /// trigger and stops the watchdog. THE SYSTEM WILL BE RESET IF THE
    /// TRIGGER TIME IS LONGER THAN THE WATCHDOG TIME
    #[arg(short = 'w', value_name = "msec", group = "action",
          value_parser = clap::value_parser!(u32).range(0..=MAX_TIME_MS))]
    pub trigger: Option<u32>,

    /// Test watchdog time: trigger with increasing pauses starting at
    /// <msec> until the watchdog resets the system
    #[arg(short = 't', value_name = "msec", group = "action",
          value_parser = clap::value_parser!(u32).range(0..=MAX_TIME_MS))]
    pub test_time: Option<u32>,

    /// Set watchdog time to <msec>, stop the watchdog if <msec> is 0
    #[arg(short = 's', value_name = "msec", group = "action",
          value_parser = clap::value_parser!(u32).range(0..=MAX_TIME_MS))]
    pub set_time: Option<u32>,

    /// Get watchdog time
    #[arg(short = 'g', group = "action")]
    pub get_time: bool,

    /// Get watchdog status
    #[arg(short = 'i', group = "action")]
    pub status: bool,

    /// Check if the watchdog had shot off the system
    #[arg(short = 'o', group = "action")]
    pub shot: bool,

    /// Print usage
    #[arg(short = '?', long = "help", action = ArgAction::Help)]
    pub help: Option<bool>,
}

/// Parse `args` and run the tool against the system environment.
///
/// Exits with 1 for bad arguments or a failed open, 0 otherwise.
pub fn main_entry<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = match parse_args::<TestArgs, _, _>(args) {
        Ok(args) => args,
        Err(code) => return code,
    };
    crate::session::with_system_env(|env| match run(&args, env) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::from(EXIT_PARAM),
    })
}

/// Run `wdog_test`.
///
/// # Errors
///
/// Returns an error if the device cannot be opened.
pub fn run(args: &TestArgs, env: &mut ToolEnv<'_>) -> Result<(), CliError> {
    let device = open_device(env, &args.device)?;
    if let Err(err) = serve(args, &*device, env) {
        tracing::debug!(error = %err, "wdog_test aborted");
    }
    if let Err(err) = close_device(env, &*device) {
        tracing::debug!(error = %err, "close failed");
    }
    Ok(())
}

fn serve(args: &TestArgs, device: &dyn WdogDevice, env: &mut ToolEnv<'_>) -> Result<(), WdogError> {
    if args.status {
        step(env, |out| query_status(device, out))?;
    }
    if args.shot {
        step(env, |out| query_shot(device, out))?;
    }
    if args.get_time {
        step(env, |out| query_time(device, out))?;
    }

    match args.set_time {
        Some(0) => step(env, |out| {
            device
                .set_status(StatusCode::Stop, 0)
                .op(DriverOp::SetStat(StatusCode::Stop))?;
            writeln!(out, "Watchdog stopped")?;
            Ok(())
        })?,
        Some(ms) => step(env, |out| {
            let value = i32::try_from(ms).unwrap_or(i32::MAX);
            device
                .set_status(StatusCode::Time, value)
                .op(DriverOp::SetStat(StatusCode::Time))?;
            writeln!(out, "Watchdog time set to {ms}msec")?;
            Ok(())
        })?,
        None => {}
    }

    if let Some(ms) = args.trigger.filter(|&ms| ms > 0) {
        let config = TriggerConfig::builder()
            .interval_ms(ms)
            .style(ProgressStyle::Counter {
                prompt: "Press any key to abort",
            })
            .build()?;
        drive_trigger_loop(env, device, config)?;
    }

    if let Some(ms) = args.test_time.filter(|&ms| ms > 0) {
        let clock = Arc::clone(&env.clock);
        return step(env, |out| {
            let Err(err) = run_time_ramp(device, &*clock, ms, out);
            Err(err)
        });
    }
    Ok(())
}

/// Run one step, printing its failure.
fn step(
    env: &mut ToolEnv<'_>,
    f: impl FnOnce(&mut dyn Write) -> Result<(), WdogError>,
) -> Result<(), WdogError> {
    let result = f(env.out);
    if let Err(err) = &result {
        env.report(err);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn parse(args: &[&str]) -> Result<TestArgs, clap::Error> {
        TestArgs::try_parse_from(std::iter::once("wdog_test").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_flags() -> TestResult {
        let args = parse(&["-i", "wdog_1", "-o", "-s=500"])?;
        assert_eq!(args.device, "wdog_1");
        assert!(args.status);
        assert!(args.shot);
        assert!(!args.get_time);
        assert_eq!(args.set_time, Some(500));
        Ok(())
    }

    #[test]
    fn test_unknown_option_rejected() {
        assert!(parse(&["wdog_1", "-x"]).is_err());
    }

    #[test]
    fn test_device_alone_rejected() {
        assert!(parse(&["wdog_1"]).is_err());
    }
}
