//! Simulated watchdog device.
//!
//! `SimDevice` models a WDOG profile watchdog with min/max/irq timers,
//! alternating trigger patterns and out/irq/err pins. It is used for every
//! device name that does not refer to a Linux character device, and by
//! tests.
//!
//! Timers are evaluated lazily on each driver call. Once an interrupt
//! signal is bound, a monitor thread additionally evaluates them every
//! millisecond so the interrupt can be raised while the caller sleeps.
//!
//! A max timeout or a too-early trigger would reset a real system; the
//! simulation records the shot, asserts the out pin and disarms.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::codes::{StatusCode, TRIG_PAT_A, TRIG_PAT_B};
use crate::device::WdogDevice;
use crate::error::{DriverError, DriverResult};

/// Default max time in microseconds.
pub const DEFAULT_TIME_MAX_US: i32 = 1_000_000;

const MONITOR_PERIOD: Duration = Duration::from_millis(1);

/// Reason codes the simulation records.
mod reason {
    pub const NONE: i32 = 0;
    pub const MIN_TIMEOUT: i32 = 1;
    pub const TIMEOUT: i32 = 2;
    pub const MANUAL: i32 = 3;
}

/// Point-in-time copy of the simulated registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimSnapshot {
    /// Counter running.
    pub armed: bool,
    /// Number of accepted triggers (plain and pattern).
    pub triggers: u64,
    /// Last written trigger pattern, 0 if none.
    pub last_pattern: i32,
    /// Min time in microseconds.
    pub time_min_us: i32,
    /// Max time in microseconds.
    pub time_max_us: i32,
    /// Irq time in microseconds.
    pub time_irq_us: i32,
    /// Output pin asserted.
    pub out_pin: bool,
    /// Irq pin asserted.
    pub irq_pin: bool,
    /// Error pin asserted.
    pub err_pin: bool,
    /// Last output pin reason.
    pub out_reason: i32,
    /// Last irq pin reason.
    pub irq_reason: i32,
    /// Watchdog caused a (simulated) reset.
    pub shot: bool,
    /// Interrupt enabled.
    pub irq_enabled: bool,
    /// Bound interrupt signal.
    pub irq_signal: Option<i32>,
}

#[derive(Debug)]
struct SimState {
    regs: SimSnapshot,
    last_trigger: Option<Instant>,
    irq_raised: bool,
    closed: bool,
}

impl SimState {
    fn new() -> Self {
        Self {
            regs: SimSnapshot {
                armed: false,
                triggers: 0,
                last_pattern: 0,
                time_min_us: 0,
                time_max_us: DEFAULT_TIME_MAX_US,
                time_irq_us: 0,
                out_pin: false,
                irq_pin: false,
                err_pin: false,
                out_reason: reason::NONE,
                irq_reason: reason::NONE,
                shot: false,
                irq_enabled: false,
                irq_signal: None,
            },
            last_trigger: None,
            irq_raised: false,
            closed: false,
        }
    }

    fn elapsed_us(&self, now: Instant) -> u128 {
        self.last_trigger
            .map_or(0, |t| now.saturating_duration_since(t).as_micros())
    }

    fn expire(&mut self, why: i32) {
        let regs = &mut self.regs;
        regs.armed = false;
        regs.out_pin = true;
        regs.out_reason = why;
        regs.shot = true;
        tracing::warn!(
            reason = why,
            "simulated watchdog expired, a real system would reset now"
        );
    }

    /// Evaluate timers; returns a signal to raise, if any.
    fn refresh(&mut self, now: Instant) -> Option<i32> {
        if !self.regs.armed {
            return None;
        }
        let elapsed = self.elapsed_us(now);

        if self.regs.time_max_us > 0 && elapsed > self.regs.time_max_us.unsigned_abs().into() {
            self.expire(reason::TIMEOUT);
            return None;
        }

        let irq_due = self.regs.irq_enabled
            && self.regs.time_irq_us > 0
            && !self.irq_raised
            && elapsed >= self.regs.time_irq_us.unsigned_abs().into();
        if irq_due {
            self.irq_raised = true;
            self.regs.irq_pin = true;
            self.regs.irq_reason = reason::TIMEOUT;
            return self.regs.irq_signal;
        }
        None
    }

    fn trigger(&mut self, now: Instant) {
        let too_early = self.regs.armed
            && self.regs.time_min_us > 0
            && self.elapsed_us(now) < self.regs.time_min_us.unsigned_abs().into();
        if too_early {
            self.expire(reason::MIN_TIMEOUT);
            return;
        }
        self.regs.triggers = self.regs.triggers.saturating_add(1);
        self.last_trigger = Some(now);
        self.irq_raised = false;
    }
}

#[derive(Debug)]
struct Shared {
    state: Mutex<SimState>,
    stop_monitor: AtomicBool,
}

/// Simulated watchdog device handle.
#[derive(Debug)]
pub struct SimDevice {
    name: String,
    shared: Arc<Shared>,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl SimDevice {
    /// Open a simulated device.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty.
    pub fn open(name: &str) -> DriverResult<Self> {
        if name.trim().is_empty() {
            return Err(DriverError::NoDevice(name.to_owned()));
        }
        Ok(Self {
            name: name.to_owned(),
            shared: Arc::new(Shared {
                state: Mutex::new(SimState::new()),
                stop_monitor: AtomicBool::new(false),
            }),
            monitor: Mutex::new(None),
        })
    }

    /// Copy of the current registers, after evaluating timers.
    #[must_use]
    pub fn snapshot(&self) -> SimSnapshot {
        let (regs, raise) = {
            let mut state = self.shared.state.lock();
            let raise = state.refresh(Instant::now());
            (state.regs, raise)
        };
        raise_signal(raise);
        regs
    }

    /// Preload the last-used trigger pattern, as left by an earlier run.
    pub fn preset_last_pattern(&self, pattern: i32) {
        self.shared.state.lock().regs.last_pattern = pattern;
    }

    fn start_monitor(&self) -> DriverResult<()> {
        let mut slot = self.monitor.lock();
        if slot.is_some() {
            return Ok(());
        }
        self.shared.stop_monitor.store(false, Ordering::Release);
        let shared = Arc::clone(&self.shared);
        let handle = std::thread::Builder::new()
            .name(format!("sim-{}-irq", self.name))
            .spawn(move || monitor_loop(&shared))?;
        *slot = Some(handle);
        Ok(())
    }

    fn stop_monitor(&self) {
        self.shared.stop_monitor.store(true, Ordering::Release);
        let handle = self.monitor.lock().take();
        if let Some(handle) = handle
            && handle.join().is_err()
        {
            tracing::error!(device = %self.name, "irq monitor thread panicked");
        }
    }

    fn get(state: &SimState, code: StatusCode) -> DriverResult<i32> {
        let regs = &state.regs;
        let value = match code {
            StatusCode::Time => regs.time_max_us / 1000,
            StatusCode::Status => i32::from(regs.armed),
            StatusCode::Shot => i32::from(regs.shot),
            StatusCode::TrigPat => regs.last_pattern,
            StatusCode::TimeMin => regs.time_min_us,
            StatusCode::TimeMax => regs.time_max_us,
            StatusCode::TimeIrq => regs.time_irq_us,
            StatusCode::OutPin => i32::from(regs.out_pin),
            StatusCode::IrqPin => i32::from(regs.irq_pin),
            StatusCode::ErrPin => i32::from(regs.err_pin),
            StatusCode::OutReason => regs.out_reason,
            StatusCode::IrqReason => regs.irq_reason,
            StatusCode::IrqEnable => i32::from(regs.irq_enabled),
            StatusCode::Start
            | StatusCode::Stop
            | StatusCode::Trig
            | StatusCode::ResetCtrl
            | StatusCode::IrqSigSet
            | StatusCode::IrqSigClr => return Err(DriverError::write_only(code)),
        };
        Ok(value)
    }

    fn set(state: &mut SimState, code: StatusCode, value: i32, now: Instant) -> DriverResult<()> {
        let flag = |value: i32| match value {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(DriverError::illegal_value(code, value)),
        };
        let non_negative = |value: i32| {
            if value < 0 {
                Err(DriverError::illegal_value(code, value))
            } else {
                Ok(value)
            }
        };

        match code {
            StatusCode::Start => {
                state.regs.armed = true;
                state.last_trigger = Some(now);
                state.irq_raised = false;
            }
            StatusCode::Stop => state.regs.armed = false,
            StatusCode::Trig => state.trigger(now),
            StatusCode::TrigPat => {
                if value != TRIG_PAT_A && value != TRIG_PAT_B {
                    return Err(DriverError::illegal_value(code, value));
                }
                if value == state.regs.last_pattern {
                    return Err(DriverError::DeviceState("trigger pattern did not alternate"));
                }
                state.regs.last_pattern = value;
                state.trigger(now);
            }
            StatusCode::Time => {
                let ms = non_negative(value)?;
                state.regs.time_max_us = ms
                    .checked_mul(1000)
                    .ok_or_else(|| DriverError::illegal_value(code, value))?;
            }
            StatusCode::TimeMin => state.regs.time_min_us = non_negative(value)?,
            StatusCode::TimeMax => state.regs.time_max_us = non_negative(value)?,
            StatusCode::TimeIrq => state.regs.time_irq_us = non_negative(value)?,
            StatusCode::ResetCtrl => {
                state.last_trigger = Some(now);
                state.irq_raised = false;
                state.regs.out_pin = false;
                state.regs.irq_pin = false;
            }
            StatusCode::OutPin => {
                state.regs.out_pin = flag(value)?;
                if state.regs.out_pin {
                    state.regs.out_reason = reason::MANUAL;
                }
            }
            StatusCode::IrqPin => {
                state.regs.irq_pin = flag(value)?;
                if state.regs.irq_pin {
                    state.regs.irq_reason = reason::MANUAL;
                }
            }
            StatusCode::ErrPin => state.regs.err_pin = flag(value)?,
            StatusCode::OutReason | StatusCode::IrqReason => {
                if value != reason::NONE {
                    return Err(DriverError::illegal_value(code, value));
                }
                if code == StatusCode::OutReason {
                    state.regs.out_reason = reason::NONE;
                } else {
                    state.regs.irq_reason = reason::NONE;
                }
            }
            StatusCode::IrqEnable => state.regs.irq_enabled = flag(value)?,
            StatusCode::IrqSigSet => {
                if value <= 0 {
                    return Err(DriverError::illegal_value(code, value));
                }
                state.regs.irq_signal = Some(value);
            }
            StatusCode::IrqSigClr => {
                if state.regs.irq_signal != Some(value) {
                    return Err(DriverError::illegal_value(code, value));
                }
                state.regs.irq_signal = None;
            }
            StatusCode::Status | StatusCode::Shot => return Err(DriverError::read_only(code)),
        }
        Ok(())
    }
}

impl WdogDevice for SimDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_status(&self, code: StatusCode) -> DriverResult<i32> {
        let (result, raise) = {
            let mut state = self.shared.state.lock();
            if state.closed {
                return Err(DriverError::Closed);
            }
            let raise = state.refresh(Instant::now());
            (Self::get(&state, code), raise)
        };
        raise_signal(raise);
        result
    }

    fn set_status(&self, code: StatusCode, value: i32) -> DriverResult<()> {
        let (result, raise) = {
            let mut state = self.shared.state.lock();
            if state.closed {
                return Err(DriverError::Closed);
            }
            let now = Instant::now();
            let raise = state.refresh(now);
            (Self::set(&mut state, code, value, now), raise)
        };
        raise_signal(raise);
        result?;

        match code {
            StatusCode::IrqSigSet => self.start_monitor()?,
            StatusCode::IrqSigClr => self.stop_monitor(),
            _ => {}
        }
        Ok(())
    }

    fn close(&self) -> DriverResult<()> {
        {
            let mut state = self.shared.state.lock();
            if state.closed {
                return Err(DriverError::Closed);
            }
            state.closed = true;
        }
        self.stop_monitor();
        Ok(())
    }
}

impl Drop for SimDevice {
    fn drop(&mut self) {
        self.stop_monitor();
    }
}

fn monitor_loop(shared: &Shared) {
    while !shared.stop_monitor.load(Ordering::Acquire) {
        let raise = {
            let mut state = shared.state.lock();
            if state.closed || state.regs.irq_signal.is_none() {
                break;
            }
            state.refresh(Instant::now())
        };
        raise_signal(raise);
        std::thread::sleep(MONITOR_PERIOD);
    }
}

#[cfg(unix)]
fn raise_signal(signal: Option<i32>) {
    if let Some(signal) = signal {
        tracing::debug!(signal, "raising watchdog interrupt signal");
        if let Err(err) = signal_hook::low_level::raise(signal) {
            tracing::warn!(signal, error = %err, "failed to raise interrupt signal");
        }
    }
}

#[cfg(not(unix))]
fn raise_signal(signal: Option<i32>) {
    if let Some(signal) = signal {
        tracing::warn!(signal, "interrupt signals are not supported on this platform");
    }
}
