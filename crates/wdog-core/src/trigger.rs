//! Watchdog trigger loop.
//!
//! Each pass sleeps the current interval, then triggers the watchdog once,
//! either with the fixed trigger code or with the next alternating pattern.
//! The interval grows by the configured increment after every pass and is
//! never clamped: a growing interval eventually exceeds the device timeout
//! and resets the system, which is what the increment mode is for.
//!
//! The loop ends when a key is pressed, the pass limit is reached or a
//! driver call fails. `run()` then issues exactly one stop.
//!
//! ```text
//! prepare (read last pattern) ──► start ──► ┌─ delay(interval) ──► trigger ─┐
//!                                           └──── key? limit? error? ◄──────┘
//!                                                        │
//!                                                        ▼
//!                                                      stop
//! ```

use std::io::Write;

use wdog_driver::{StatusCode, TRIG_PAT_A, TRIG_PAT_B, TRIG_PAT_TOGGLE, WdogDevice};

use crate::config::{ProgressStyle, TriggerConfig, TriggerMode};
use crate::error::{DriverOp, DriverResultExt, WdogError, WdogResult};
use crate::os::{Clock, KeyPoller};

/// Alternation state of the pattern trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternToggle {
    next: i32,
}

impl PatternToggle {
    /// Start with the pattern that differs from `last`.
    ///
    /// After a warm restart the device still holds the last pattern of the
    /// previous run; writing it again would be taken as a stuck trigger.
    #[must_use]
    pub fn after(last: i32) -> Self {
        let next = if last == TRIG_PAT_A {
            TRIG_PAT_B
        } else {
            TRIG_PAT_A
        };
        Self { next }
    }

    /// Pattern the next pass will write.
    #[must_use]
    pub fn peek(&self) -> i32 {
        self.next
    }

    /// Take the next pattern and flip.
    pub fn advance(&mut self) -> i32 {
        let pattern = self.next;
        self.next ^= TRIG_PAT_TOGGLE;
        pattern
    }
}

/// Why the loop stopped passing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A key was pressed.
    KeyPressed,
    /// The pass limit was reached.
    PassLimit,
}

/// Loop-local counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerState {
    /// Completed passes.
    pub passes: u64,
    /// Delay of the next pass in milliseconds.
    pub interval_ms: u64,
    /// Pattern alternation, in pattern mode.
    pub pattern: Option<PatternToggle>,
}

/// What a loop run did.
#[derive(Debug)]
pub struct LoopOutcome {
    /// Completed passes.
    pub passes: u64,
    /// Interval the next pass would have used.
    pub next_interval_ms: u64,
    /// Stop condition; `None` if a driver call ended the loop.
    pub stop_reason: Option<StopReason>,
    /// Driver failure that ended the loop.
    pub error: Option<WdogError>,
    /// Failure of the final stop call.
    pub stop_error: Option<WdogError>,
}

impl LoopOutcome {
    /// True if neither the loop nor the stop failed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.stop_error.is_none()
    }
}

/// Collaborators the loop needs besides the device.
pub struct LoopIo<'a> {
    /// Delay source.
    pub clock: &'a dyn Clock,
    /// Key poll.
    pub keys: &'a mut dyn KeyPoller,
    /// Console.
    pub out: &'a mut dyn Write,
}

impl core::fmt::Debug for LoopIo<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoopIo").finish_non_exhaustive()
    }
}

/// Trigger loop over one device.
pub struct TriggerLoop<'a> {
    device: &'a dyn WdogDevice,
    config: TriggerConfig,
    state: TriggerState,
}

impl core::fmt::Debug for TriggerLoop<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TriggerLoop")
            .field("device", &self.device.name())
            .field("config", &self.config)
            .field("state", &self.state)
            .finish()
    }
}

impl<'a> TriggerLoop<'a> {
    /// Create a loop; nothing is sent to the device yet.
    #[must_use]
    pub fn new(device: &'a dyn WdogDevice, config: TriggerConfig) -> Self {
        Self {
            device,
            config,
            state: TriggerState {
                passes: 0,
                interval_ms: u64::from(config.interval_ms),
                pattern: None,
            },
        }
    }

    /// Current loop counters.
    #[must_use]
    pub fn state(&self) -> TriggerState {
        self.state
    }

    /// Read the last used pattern in pattern mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern cannot be read.
    pub fn prepare(&mut self) -> WdogResult<()> {
        if self.config.mode == TriggerMode::Pattern {
            let last = self
                .device
                .get_status(StatusCode::TrigPat)
                .op(DriverOp::GetStat(StatusCode::TrigPat))?;
            let toggle = PatternToggle::after(last);
            tracing::debug!(last, next = toggle.peek(), "pattern trigger prepared");
            self.state.pattern = Some(toggle);
        }
        Ok(())
    }

    /// Start the watchdog and announce the trigger interval.
    ///
    /// # Errors
    ///
    /// Returns an error if the start call or the console write fails.
    pub fn start(&mut self, out: &mut dyn Write) -> WdogResult<()> {
        self.device
            .set_status(StatusCode::Start, 0)
            .op(DriverOp::SetStat(StatusCode::Start))?;
        tracing::info!(
            device = self.device.name(),
            interval_ms = self.config.interval_ms,
            "watchdog started"
        );
        writeln!(
            out,
            "Watchdog started - trigger all {}msec",
            self.config.interval_ms
        )?;
        Ok(())
    }

    /// Prepare, start, run passes until a stop condition, then stop.
    ///
    /// # Errors
    ///
    /// Returns an error if preparing or starting fails. Failures after the
    /// loop was entered are carried in the outcome.
    pub fn run(&mut self, io: &mut LoopIo<'_>) -> WdogResult<LoopOutcome> {
        self.prepare()?;
        self.start(io.out)?;
        let mut outcome = self.run_passes(io);
        outcome.stop_error = self.stop(io.out).err();
        Ok(outcome)
    }

    /// Stop the watchdog.
    ///
    /// # Errors
    ///
    /// Returns an error if the stop call or the console write fails.
    pub fn stop(&mut self, out: &mut dyn Write) -> WdogResult<()> {
        self.device
            .set_status(StatusCode::Stop, 0)
            .op(DriverOp::SetStat(StatusCode::Stop))?;
        tracing::info!(device = self.device.name(), "watchdog stopped");
        writeln!(out, "Watchdog stopped")?;
        Ok(())
    }

    /// Run passes until a stop condition; the watchdog must be started.
    pub fn run_passes(&mut self, io: &mut LoopIo<'_>) -> LoopOutcome {
        let result = self.pass_loop(io);
        let mut outcome = LoopOutcome {
            passes: self.state.passes,
            next_interval_ms: self.state.interval_ms,
            stop_reason: result.as_ref().ok().copied(),
            error: result.err(),
            stop_error: None,
        };
        if self.config.style == ProgressStyle::Dots
            && let Err(err) = writeln!(io.out)
        {
            outcome.error.get_or_insert(WdogError::Console(err));
        }
        outcome
    }

    fn pass_loop(&mut self, io: &mut LoopIo<'_>) -> WdogResult<StopReason> {
        loop {
            io.clock.delay(self.state.interval_ms);
            self.state.passes = self.state.passes.saturating_add(1);
            self.trigger_once(io.out)?;

            if self.config.increment_ms != 0 {
                self.state.interval_ms = self
                    .state
                    .interval_ms
                    .saturating_add(u64::from(self.config.increment_ms));
            }

            if let Some(key) = io.keys.poll_key() {
                tracing::debug!(?key, passes = self.state.passes, "key pressed");
                return Ok(StopReason::KeyPressed);
            }
            if let Some(limit) = self.config.abort_after
                && self.state.passes >= u64::from(limit.get())
            {
                tracing::debug!(passes = self.state.passes, "pass limit reached");
                return Ok(StopReason::PassLimit);
            }
        }
    }

    fn trigger_once(&mut self, out: &mut dyn Write) -> WdogResult<()> {
        let seq = self.state.passes;
        let interval = self.state.interval_ms;
        let pattern = self.state.pattern.as_mut().map(PatternToggle::advance);

        match self.config.style {
            ProgressStyle::Verbose => {
                let with = pattern
                    .map(|p| format!("with pattern 0x{p:x} "))
                    .unwrap_or_default();
                writeln!(
                    out,
                    "#{seq:06}: Trigger watchdog {with}after {interval}ms (press any key to abort)"
                )?;
            }
            ProgressStyle::Counter { prompt } => {
                writeln!(out, "  ({seq:6}) Trigger watchdog - {prompt}")?;
            }
            ProgressStyle::Dots => {}
        }

        tracing::trace!(seq, interval, ?pattern, "trigger");
        match pattern {
            Some(p) => self
                .device
                .set_status(StatusCode::TrigPat, p)
                .op(DriverOp::SetStat(StatusCode::TrigPat))?,
            None => self
                .device
                .set_status(StatusCode::Trig, 0)
                .op(DriverOp::SetStat(StatusCode::Trig))?,
        }

        if self.config.style == ProgressStyle::Dots {
            write!(out, ".")?;
            out.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wdog_driver::SimDevice;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    struct NoDelay;

    impl Clock for NoDelay {
        fn delay(&self, _ms: u64) {}
    }

    struct NoKeys;

    impl KeyPoller for NoKeys {
        fn poll_key(&mut self) -> Option<char> {
            None
        }
    }

    #[test]
    fn test_pattern_toggle_after_last() {
        assert_eq!(PatternToggle::after(TRIG_PAT_A).peek(), TRIG_PAT_B);
        assert_eq!(PatternToggle::after(TRIG_PAT_B).peek(), TRIG_PAT_A);
        assert_eq!(PatternToggle::after(0).peek(), TRIG_PAT_A);

        let mut toggle = PatternToggle::after(TRIG_PAT_B);
        assert_eq!(toggle.advance(), TRIG_PAT_A);
        assert_eq!(toggle.advance(), TRIG_PAT_B);
        assert_eq!(toggle.advance(), TRIG_PAT_A);
    }

    #[test]
    fn test_dots_output() -> TestResult {
        let dev = SimDevice::open("wdog_1")?;
        let config = TriggerConfig::builder()
            .interval_ms(10)
            .abort_after(3)
            .build()?;
        let mut out = Vec::new();
        let mut keys = NoKeys;
        let mut io = LoopIo {
            clock: &NoDelay,
            keys: &mut keys,
            out: &mut out,
        };
        let outcome = TriggerLoop::new(&dev, config).run(&mut io)?;
        assert!(outcome.is_ok());
        assert_eq!(outcome.passes, 3);
        assert_eq!(outcome.stop_reason, Some(StopReason::PassLimit));
        assert_eq!(
            String::from_utf8(out)?,
            "Watchdog started - trigger all 10msec\n...\nWatchdog stopped\n"
        );
        assert_eq!(dev.snapshot().triggers, 3);
        Ok(())
    }

    #[test]
    fn test_verbose_pattern_output() -> TestResult {
        let dev = SimDevice::open("wdog_1")?;
        dev.preset_last_pattern(TRIG_PAT_A);
        let config = TriggerConfig::builder()
            .interval_ms(100)
            .mode(TriggerMode::Pattern)
            .increment_ms(50)
            .abort_after(2)
            .style(ProgressStyle::Verbose)
            .build()?;
        let mut out = Vec::new();
        let mut keys = NoKeys;
        let mut io = LoopIo {
            clock: &NoDelay,
            keys: &mut keys,
            out: &mut out,
        };
        let outcome = TriggerLoop::new(&dev, config).run(&mut io)?;
        assert!(outcome.is_ok());
        assert_eq!(outcome.next_interval_ms, 200);
        assert_eq!(
            String::from_utf8(out)?,
            "Watchdog started - trigger all 100msec\n\
             #000001: Trigger watchdog with pattern 0xaaaa after 100ms (press any key to abort)\n\
             #000002: Trigger watchdog with pattern 0x5555 after 150ms (press any key to abort)\n\
             Watchdog stopped\n"
        );
        Ok(())
    }

    #[test]
    fn test_counter_output() -> TestResult {
        let dev = SimDevice::open("wdog_1")?;
        let config = TriggerConfig::builder()
            .interval_ms(100)
            .abort_after(2)
            .style(ProgressStyle::Counter {
                prompt: "Press any key to abort",
            })
            .build()?;
        let mut out = Vec::new();
        let mut keys = NoKeys;
        let mut io = LoopIo {
            clock: &NoDelay,
            keys: &mut keys,
            out: &mut out,
        };
        let mut trigger = TriggerLoop::new(&dev, config);
        trigger.start(io.out)?;
        let outcome = trigger.run_passes(&mut io);
        assert!(outcome.is_ok());
        assert_eq!(
            String::from_utf8(out)?,
            "Watchdog started - trigger all 100msec\n\
             \x20 (     1) Trigger watchdog - Press any key to abort\n\
             \x20 (     2) Trigger watchdog - Press any key to abort\n"
        );
        assert!(dev.snapshot().armed);
        Ok(())
    }
}
