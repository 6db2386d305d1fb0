//! Collaborators and shared steps of a tool run.

use std::fmt::Display;
use std::io::{IsTerminal, Write};
use std::sync::Arc;

use wdog_core::os::{Clock, KeyPoller, SystemClock, TerminalKeyPoller};
use wdog_core::trigger::{LoopIo, TriggerLoop};
use wdog_core::{DriverOp, DriverResultExt, TriggerConfig, WdogError};
use wdog_driver::{SystemDriver, WdogDevice, WdogDriver};

use crate::output::print_error;

/// Everything a tool talks to besides its arguments.
pub struct ToolEnv<'a> {
    /// Opens devices by name.
    pub driver: &'a dyn WdogDriver,
    /// Delay source, shared with the interrupt handler.
    pub clock: Arc<dyn Clock>,
    /// Key poll for the trigger loops.
    pub keys: &'a mut dyn KeyPoller,
    /// Console.
    pub out: &'a mut dyn Write,
    /// Color the error marker; set only when `out` is a terminal.
    pub color: bool,
}

impl ToolEnv<'_> {
    /// Print an error line on the console.
    pub fn report(&mut self, error: &dyn Display) {
        print_error(self.out, self.color, error);
    }
}

impl core::fmt::Debug for ToolEnv<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ToolEnv").finish_non_exhaustive()
    }
}

/// Run `f` with the real driver, clock, terminal and stdout.
pub fn with_system_env<R>(f: impl FnOnce(&mut ToolEnv<'_>) -> R) -> R {
    let driver = SystemDriver::new();
    let mut keys = TerminalKeyPoller::new();
    let mut out = std::io::stdout();
    let color = out.is_terminal();
    let mut env = ToolEnv {
        driver: &driver,
        clock: Arc::new(SystemClock),
        keys: &mut keys,
        out: &mut out,
        color,
    };
    f(&mut env)
}

/// Open `name`, printing the failure.
///
/// # Errors
///
/// Returns the open failure.
pub fn open_device(env: &mut ToolEnv<'_>, name: &str) -> Result<Arc<dyn WdogDevice>, WdogError> {
    env.driver.open(name).op(DriverOp::Open).map_err(|err| {
        env.report(&err);
        err
    })
}

/// Close the device, printing the failure.
///
/// # Errors
///
/// Returns the close failure.
pub fn close_device(env: &mut ToolEnv<'_>, device: &dyn WdogDevice) -> Result<(), WdogError> {
    let result = device.close().op(DriverOp::Close);
    if let Err(err) = &result {
        env.report(err);
    } else {
        tracing::debug!(device = device.name(), "device closed");
    }
    result
}

/// Start the watchdog, trigger until a stop condition, then stop it.
///
/// Every failure is printed where it happens. A failure inside the loop
/// is printed before the stop is attempted.
///
/// # Errors
///
/// Returns the first failure.
pub fn drive_trigger_loop(
    env: &mut ToolEnv<'_>,
    device: &dyn WdogDevice,
    config: TriggerConfig,
) -> Result<(), WdogError> {
    let mut trigger = TriggerLoop::new(device, config);
    if let Err(err) = trigger.prepare().and_then(|()| trigger.start(env.out)) {
        env.report(&err);
        return Err(err);
    }

    let clock = Arc::clone(&env.clock);
    let mut io = LoopIo {
        clock: &*clock,
        keys: &mut *env.keys,
        out: &mut *env.out,
    };
    let outcome = trigger.run_passes(&mut io);
    if let Some(err) = &outcome.error {
        env.report(err);
    }
    tracing::debug!(
        passes = outcome.passes,
        stop_reason = ?outcome.stop_reason,
        "trigger loop finished"
    );

    let stopped = trigger.stop(env.out);
    if let Err(err) = &stopped {
        env.report(err);
    }
    match outcome.error {
        Some(err) => Err(err),
        None => stopped,
    }
}
