//! Error types for watchdog tool operations.

use core::fmt;

use wdog_driver::{DriverError, StatusCode};

/// A driver primitive, named the way failures are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverOp {
    /// Opening the device.
    Open,
    /// Reading a status code.
    GetStat(StatusCode),
    /// Writing a status code.
    SetStat(StatusCode),
    /// Closing the device.
    Close,
}

impl fmt::Display for DriverOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("open"),
            Self::GetStat(code) => write!(f, "getstat {code}"),
            Self::SetStat(code) => write!(f, "setstat {code}"),
            Self::Close => f.write_str("close"),
        }
    }
}

/// Parameter combinations rejected before any device access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    /// Plain and pattern trigger intervals both given.
    #[error("-T and -P specified, this is not supported")]
    TriggerModeConflict,

    /// Increment given without a trigger interval.
    #[error("-I requires -T/-P")]
    IncrementWithoutTrigger,

    /// Post-interrupt reset delay without trigger interval or irq time.
    #[error("-R requires -T/-P and -q>0")]
    ResetDelayRequirements,

    /// A value outside its allowed range.
    #[error("{0}")]
    InvalidValue(String),
}

impl ParamError {
    /// Create an invalid value error.
    #[must_use]
    pub fn invalid_value(msg: impl Into<String>) -> Self {
        Self::InvalidValue(msg.into())
    }
}

/// Errors raised while driving a watchdog.
#[derive(Debug, thiserror::Error)]
pub enum WdogError {
    /// A driver primitive failed.
    #[error("can't {op}: {source}")]
    Driver {
        /// The failing operation.
        op: DriverOp,
        /// The driver's error.
        #[source]
        source: DriverError,
    },

    /// Invalid parameters.
    #[error(transparent)]
    Param(#[from] ParamError),

    /// Signal registration failed.
    #[error("can't install signal handler: {0}")]
    Signal(#[source] std::io::Error),

    /// Console output failed.
    #[error("console output failed: {0}")]
    Console(#[from] std::io::Error),
}

impl WdogError {
    /// Wrap a driver error with the operation that produced it.
    #[must_use]
    pub fn driver(op: DriverOp, source: DriverError) -> Self {
        Self::Driver { op, source }
    }

    /// The failing driver operation, if this is a driver error.
    #[must_use]
    pub fn driver_op(&self) -> Option<DriverOp> {
        match self {
            Self::Driver { op, .. } => Some(*op),
            _ => None,
        }
    }
}

/// A specialized `Result` type for watchdog tool operations.
pub type WdogResult<T> = core::result::Result<T, WdogError>;

/// Attach the failing operation to a driver result.
pub trait DriverResultExt<T> {
    /// Map the driver error into [`WdogError::Driver`] for `op`.
    ///
    /// # Errors
    ///
    /// Returns the wrapped error if `self` is an error.
    fn op(self, op: DriverOp) -> WdogResult<T>;
}

impl<T> DriverResultExt<T> for Result<T, DriverError> {
    fn op(self, op: DriverOp) -> WdogResult<T> {
        self.map_err(|source| {
            tracing::warn!(%op, error = %source, "driver call failed");
            WdogError::driver(op, source)
        })
    }
}
