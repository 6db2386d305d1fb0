//! Trigger configuration and parameter validation.
//!
//! `LoopParams` is the raw option set a tool collected; `validate()` turns
//! it into an immutable `LoopPlan` or rejects it without touching a device.

use core::num::NonZeroU32;

use crate::error::ParamError;

/// How each pass triggers the watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerMode {
    /// Write the fixed trigger code.
    #[default]
    Plain,
    /// Write alternating bit patterns.
    Pattern,
}

/// Console progress output of the trigger loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressStyle {
    /// One line per pass with sequence number, pattern and interval.
    Verbose,
    /// One `.` per pass, newline when the loop ends.
    #[default]
    Dots,
    /// `  (     n) Trigger watchdog - <prompt>` before each trigger.
    Counter {
        /// Text after the dash.
        prompt: &'static str,
    },
}

/// Immutable trigger loop configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerConfig {
    /// Delay before the first trigger in milliseconds.
    pub interval_ms: u32,
    /// Plain or pattern trigger.
    pub mode: TriggerMode,
    /// Added to the delay after every pass.
    pub increment_ms: u32,
    /// Stop after this many passes.
    pub abort_after: Option<NonZeroU32>,
    /// Console output style.
    pub style: ProgressStyle,
}

impl TriggerConfig {
    /// Create a plain trigger configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `interval_ms` is zero.
    pub fn new(interval_ms: u32) -> Result<Self, ParamError> {
        Self::builder().interval_ms(interval_ms).build()
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> TriggerConfigBuilder {
        TriggerConfigBuilder::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the interval is zero.
    pub fn validate(&self) -> Result<(), ParamError> {
        if self.interval_ms == 0 {
            return Err(ParamError::invalid_value(
                "trigger interval must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Builder for `TriggerConfig`.
#[derive(Debug, Default)]
pub struct TriggerConfigBuilder {
    interval_ms: u32,
    mode: TriggerMode,
    increment_ms: u32,
    abort_after: u32,
    style: ProgressStyle,
}

impl TriggerConfigBuilder {
    /// Set the trigger interval in milliseconds.
    #[must_use]
    pub fn interval_ms(mut self, ms: u32) -> Self {
        self.interval_ms = ms;
        self
    }

    /// Set the trigger mode.
    #[must_use]
    pub fn mode(mut self, mode: TriggerMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the per-pass increment in milliseconds.
    #[must_use]
    pub fn increment_ms(mut self, ms: u32) -> Self {
        self.increment_ms = ms;
        self
    }

    /// Stop after `passes` passes; 0 means no limit.
    #[must_use]
    pub fn abort_after(mut self, passes: u32) -> Self {
        self.abort_after = passes;
        self
    }

    /// Set the progress output style.
    #[must_use]
    pub fn style(mut self, style: ProgressStyle) -> Self {
        self.style = style;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<TriggerConfig, ParamError> {
        let config = TriggerConfig {
            interval_ms: self.interval_ms,
            mode: self.mode,
            increment_ms: self.increment_ms,
            abort_after: NonZeroU32::new(self.abort_after),
            style: self.style,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Loop-related options as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopParams {
    /// Plain trigger interval.
    pub trigger_ms: Option<u32>,
    /// Pattern trigger interval.
    pub pattern_ms: Option<u32>,
    /// Per-pass increment.
    pub increment_ms: u32,
    /// Reset delay after an interrupt signal.
    pub reset_delay_ms: Option<u32>,
    /// Interrupt time.
    pub irq_time_ms: Option<u32>,
    /// Pass limit, 0 for none.
    pub abort_after: Option<u32>,
    /// Per-pass console lines instead of dots.
    pub verbose: bool,
}

/// Validated loop options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopPlan {
    /// Trigger loop to run; `None` when no interval was given or it is 0.
    pub trigger: Option<TriggerConfig>,
    /// Reset delay for the interrupt handler.
    pub reset_delay_ms: Option<u32>,
}

impl LoopParams {
    /// The configured trigger interval, plain or pattern.
    #[must_use]
    pub fn interval_ms(&self) -> Option<u32> {
        self.trigger_ms.or(self.pattern_ms)
    }

    /// Check the option combination and compute the loop plan.
    ///
    /// # Errors
    ///
    /// Returns an error if plain and pattern intervals are both given, an
    /// increment is given without interval, or a reset delay is given
    /// without interval and a positive irq time.
    pub fn validate(&self) -> Result<LoopPlan, ParamError> {
        if self.trigger_ms.is_some() && self.pattern_ms.is_some() {
            return Err(ParamError::TriggerModeConflict);
        }
        let interval = self.interval_ms();
        if self.increment_ms != 0 && interval.is_none() {
            return Err(ParamError::IncrementWithoutTrigger);
        }
        let irq_positive = self.irq_time_ms.is_some_and(|ms| ms > 0);
        if self.reset_delay_ms.is_some() && (interval.is_none() || !irq_positive) {
            return Err(ParamError::ResetDelayRequirements);
        }

        let mode = if self.pattern_ms.is_some() {
            TriggerMode::Pattern
        } else {
            TriggerMode::Plain
        };
        let style = if self.verbose {
            ProgressStyle::Verbose
        } else {
            ProgressStyle::Dots
        };
        let trigger = match interval {
            Some(ms) if ms > 0 => Some(
                TriggerConfig::builder()
                    .interval_ms(ms)
                    .mode(mode)
                    .increment_ms(self.increment_ms)
                    .abort_after(self.abort_after.unwrap_or(0))
                    .style(style)
                    .build()?,
            ),
            _ => None,
        };
        Ok(LoopPlan {
            trigger,
            reset_delay_ms: self.reset_delay_ms,
        })
    }
}
