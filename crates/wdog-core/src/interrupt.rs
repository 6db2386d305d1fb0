//! Interrupt-driven watchdog reset.
//!
//! When the device's irq time elapses without a trigger it raises the
//! bound signal. The handler counts the occurrence and, with a reset delay
//! configured, waits that long and then resets the watchdog so the test
//! never escalates to the min/max timeout.
//!
//! The reset issued here and the triggers issued by the main loop go to the
//! same handle without coordination. The device backend serializes them.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use wdog_driver::{StatusCode, WdogDevice};

use crate::error::{DriverOp, DriverResultExt};
use crate::os::Clock;

/// State shared between the main flow and the signal callback.
pub struct ControlState {
    device: Arc<dyn WdogDevice>,
    clock: Arc<dyn Clock>,
    signal: i32,
    reset_delay_ms: Option<u32>,
    sig_count: AtomicU32,
}

impl core::fmt::Debug for ControlState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ControlState")
            .field("device", &self.device.name())
            .field("signal", &self.signal)
            .field("reset_delay_ms", &self.reset_delay_ms)
            .field("sig_count", &self.signal_count())
            .finish_non_exhaustive()
    }
}

impl ControlState {
    /// Create the control state for `signal`.
    #[must_use]
    pub fn new(
        device: Arc<dyn WdogDevice>,
        clock: Arc<dyn Clock>,
        signal: i32,
        reset_delay_ms: Option<u32>,
    ) -> Self {
        Self {
            device,
            clock,
            signal,
            reset_delay_ms,
            sig_count: AtomicU32::new(0),
        }
    }

    /// The shared device handle.
    #[must_use]
    pub fn device(&self) -> &Arc<dyn WdogDevice> {
        &self.device
    }

    /// Number of interrupt signals received so far.
    #[must_use]
    pub fn signal_count(&self) -> u32 {
        self.sig_count.load(Ordering::Acquire)
    }

    /// Handle one signal delivery.
    ///
    /// Console write failures are logged; a failing reset is reported on
    /// `out` since there is no caller to return it to.
    pub fn on_signal(&self, signal: i32, out: &mut dyn Write) {
        if signal != self.signal {
            tracing::debug!(signal, "ignoring unexpected signal");
            return;
        }
        let count = self
            .sig_count
            .fetch_add(1, Ordering::AcqRel)
            .wrapping_add(1);
        tracing::info!(count, "watchdog interrupt signal received");
        let mut lines = vec![format!("==> interrupt signal #{count} received")];

        if let Some(delay) = self.reset_delay_ms {
            self.clock.delay(u64::from(delay));
            match self
                .device
                .set_status(StatusCode::ResetCtrl, 0)
                .op(DriverOp::SetStat(StatusCode::ResetCtrl))
            {
                Ok(()) => lines.push(format!("    watchdog reset after {delay}ms")),
                Err(err) => lines.push(format!("*** {err}")),
            }
        }

        for line in lines {
            if let Err(err) = writeln!(out, "{line}") {
                tracing::warn!(error = %err, "failed to write signal report");
                return;
            }
        }
        if let Err(err) = out.flush() {
            tracing::warn!(error = %err, "failed to flush signal report");
        }
    }
}
