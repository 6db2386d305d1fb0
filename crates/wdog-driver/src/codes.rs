//! Status codes understood by WDOG profile drivers.
//!
//! Device-specific codes live at the driver-private offset `0x200`; the
//! interrupt enable code is one of the generic codes every driver shares.

use core::fmt;

const DEV_OF: i32 = 0x200;
const MK_OF: i32 = 0x100;

/// First alternating trigger pattern.
pub const TRIG_PAT_A: i32 = 0x5555;

/// Second alternating trigger pattern.
pub const TRIG_PAT_B: i32 = 0xAAAA;

/// XOR mask that flips one trigger pattern into the other.
pub const TRIG_PAT_TOGGLE: i32 = TRIG_PAT_A ^ TRIG_PAT_B;

/// Value reported by `SHOT` when the driver cannot tell who reset the system.
pub const SHOT_NOT_IDENTIFIABLE: i32 = 255;

/// A get/set status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Watchdog time in milliseconds (legacy code, mirrors the max time).
    Time,
    /// Counter state: 0 disabled, 1 enabled.
    Status,
    /// Whether the watchdog caused the last system reset.
    Shot,
    /// Start the watchdog.
    Start,
    /// Stop the watchdog.
    Stop,
    /// Trigger the watchdog with a fixed code.
    Trig,
    /// Trigger the watchdog with an alternating pattern; get returns the last pattern.
    TrigPat,
    /// Lower trigger time limit in microseconds.
    TimeMin,
    /// Upper trigger time limit in microseconds.
    TimeMax,
    /// Interrupt time in microseconds.
    TimeIrq,
    /// Restart the counter and clear out/irq pins.
    ResetCtrl,
    /// Output pin state.
    OutPin,
    /// Interrupt pin state.
    IrqPin,
    /// Error pin state.
    ErrPin,
    /// Reason of the last output pin assertion.
    OutReason,
    /// Reason of the last interrupt pin assertion.
    IrqReason,
    /// Bind an OS signal to the watchdog interrupt.
    IrqSigSet,
    /// Remove the signal binding.
    IrqSigClr,
    /// Generic interrupt enable.
    IrqEnable,
}

impl StatusCode {
    /// Every code, in numeric order.
    pub const ALL: [Self; 19] = [
        Self::Time,
        Self::Status,
        Self::Shot,
        Self::Start,
        Self::Stop,
        Self::Trig,
        Self::TrigPat,
        Self::TimeMin,
        Self::TimeMax,
        Self::TimeIrq,
        Self::ResetCtrl,
        Self::OutPin,
        Self::IrqPin,
        Self::ErrPin,
        Self::OutReason,
        Self::IrqReason,
        Self::IrqSigSet,
        Self::IrqSigClr,
        Self::IrqEnable,
    ];

    /// Numeric code as passed to the driver.
    #[must_use]
    pub const fn raw(self) -> i32 {
        match self {
            Self::Time => DEV_OF,
            Self::Status => DEV_OF + 0x01,
            Self::Shot => DEV_OF + 0x02,
            Self::Start => DEV_OF + 0x03,
            Self::Stop => DEV_OF + 0x04,
            Self::Trig => DEV_OF + 0x05,
            Self::TrigPat => DEV_OF + 0x06,
            Self::TimeMin => DEV_OF + 0x07,
            Self::TimeMax => DEV_OF + 0x08,
            Self::TimeIrq => DEV_OF + 0x09,
            Self::ResetCtrl => DEV_OF + 0x0a,
            Self::OutPin => DEV_OF + 0x0b,
            Self::IrqPin => DEV_OF + 0x0c,
            Self::ErrPin => DEV_OF + 0x0d,
            Self::OutReason => DEV_OF + 0x0e,
            Self::IrqReason => DEV_OF + 0x0f,
            Self::IrqSigSet => DEV_OF + 0x10,
            Self::IrqSigClr => DEV_OF + 0x11,
            Self::IrqEnable => MK_OF + 0x0c,
        }
    }

    /// Look up a code by its numeric value.
    #[must_use]
    pub fn from_raw(raw: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.raw() == raw)
    }

    /// Name used in console and error output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Time => "WDOG_TIME",
            Self::Status => "WDOG_STATUS",
            Self::Shot => "WDOG_SHOT",
            Self::Start => "WDOG_START",
            Self::Stop => "WDOG_STOP",
            Self::Trig => "WDOG_TRIG",
            Self::TrigPat => "WDOG_TRIG_PAT",
            Self::TimeMin => "WDOG_TIME_MIN",
            Self::TimeMax => "WDOG_TIME_MAX",
            Self::TimeIrq => "WDOG_TIME_IRQ",
            Self::ResetCtrl => "WDOG_RESET_CTRL",
            Self::OutPin => "WDOG_OUT_PIN",
            Self::IrqPin => "WDOG_IRQ_PIN",
            Self::ErrPin => "WDOG_ERR_PIN",
            Self::OutReason => "WDOG_OUT_REASON",
            Self::IrqReason => "WDOG_IRQ_REASON",
            Self::IrqSigSet => "WDOG_IRQ_SIGSET",
            Self::IrqSigClr => "WDOG_IRQ_SIGCLR",
            Self::IrqEnable => "M_MK_IRQ_ENABLE",
        }
    }

    /// Whether the code carries a pin state.
    #[must_use]
    pub const fn is_pin(self) -> bool {
        matches!(self, Self::OutPin | Self::IrqPin | Self::ErrPin)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Trigger pattern at index 0 or 1.
#[must_use]
pub const fn trig_pattern(index: usize) -> i32 {
    if index == 0 { TRIG_PAT_A } else { TRIG_PAT_B }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn raw_values_are_unique() {
        let raws: HashSet<i32> = StatusCode::ALL.iter().map(|c| c.raw()).collect();
        assert_eq!(raws.len(), StatusCode::ALL.len());
    }

    #[test]
    fn from_raw_round_trips_every_code() {
        for code in StatusCode::ALL {
            assert_eq!(StatusCode::from_raw(code.raw()), Some(code));
        }
        assert_eq!(StatusCode::from_raw(0), None);
    }

    #[test]
    fn patterns_toggle_into_each_other() {
        assert_eq!(TRIG_PAT_A ^ TRIG_PAT_TOGGLE, TRIG_PAT_B);
        assert_eq!(TRIG_PAT_B ^ TRIG_PAT_TOGGLE, TRIG_PAT_A);
        assert_eq!(trig_pattern(0), TRIG_PAT_A);
        assert_eq!(trig_pattern(1), TRIG_PAT_B);
    }

    #[test]
    fn display_uses_driver_names() {
        assert_eq!(StatusCode::TrigPat.to_string(), "WDOG_TRIG_PAT");
        assert_eq!(StatusCode::IrqEnable.to_string(), "M_MK_IRQ_ENABLE");
    }
}
