//! Watchdog time ramp test.
//!
//! Starts the watchdog and triggers it with ever longer pauses until the
//! pause exceeds the watchdog time and the system resets. The step grows
//! with the pause so long timeouts are reached in reasonable time.

use core::convert::Infallible;
use std::io::Write;

use wdog_driver::{StatusCode, WdogDevice};

use crate::error::{DriverOp, DriverResultExt, WdogResult};
use crate::os::Clock;

/// Step added to a pause of `pause_ms` before the next pass.
#[must_use]
pub fn ramp_step(pause_ms: u64, current_step: u64) -> u64 {
    match pause_ms {
        10_000.. => 1000,
        1000.. => 100,
        100.. => 10,
        _ => current_step,
    }
}

/// Run the ramp from `start_ms`.
///
/// Only returns when a driver call or the console fails; on real hardware
/// the watchdog resets the system first.
///
/// # Errors
///
/// Returns the first failure.
pub fn run_time_ramp(
    device: &dyn WdogDevice,
    clock: &dyn Clock,
    start_ms: u32,
    out: &mut dyn Write,
) -> WdogResult<Infallible> {
    device
        .set_status(StatusCode::Start, 0)
        .op(DriverOp::SetStat(StatusCode::Start))?;
    writeln!(out, "Watchdog started - force system reset")?;
    tracing::info!(device = device.name(), start_ms, "time ramp started");

    let mut pause = u64::from(start_ms);
    let mut step = 1;
    loop {
        clock.delay(pause);
        writeln!(out, "  Trigger watchdog after {pause:6}msec")?;
        device
            .set_status(StatusCode::Trig, 0)
            .op(DriverOp::SetStat(StatusCode::Trig))?;
        step = ramp_step(pause, step);
        pause = pause.saturating_add(step);
    }
}
