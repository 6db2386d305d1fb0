//! Error types for driver facade operations.

use crate::codes::StatusCode;

/// Errors a watchdog device handle can report.
///
/// The `Display` text is the driver-supplied error string that the tools
/// print next to the failing operation.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// No device with this name could be opened.
    #[error("no such device '{0}'")]
    NoDevice(String),

    /// The backend does not implement the status code.
    #[error("unknown status code {code} (0x{raw:04x})", raw = .code.raw())]
    UnsupportedCode {
        /// The rejected code.
        code: StatusCode,
    },

    /// The code is known but cannot be read, or cannot be written.
    #[error("status code {code} is {access}")]
    WrongAccess {
        /// The rejected code.
        code: StatusCode,
        /// `"read-only"` or `"write-only"`.
        access: &'static str,
    },

    /// The value is out of range for the code.
    #[error("illegal value {value} for {code}")]
    IllegalValue {
        /// The code being set.
        code: StatusCode,
        /// The rejected value.
        value: i32,
    },

    /// The watchdog is not in a state that allows the operation.
    #[error("{0}")]
    DeviceState(&'static str),

    /// The handle was closed.
    #[error("path closed")]
    Closed,

    /// Underlying operating system error.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl DriverError {
    /// Create an unsupported code error.
    #[must_use]
    pub fn unsupported(code: StatusCode) -> Self {
        Self::UnsupportedCode { code }
    }

    /// Create an illegal value error.
    #[must_use]
    pub fn illegal_value(code: StatusCode, value: i32) -> Self {
        Self::IllegalValue { code, value }
    }

    /// Create a read-only error for a set on a get-only code.
    #[must_use]
    pub fn read_only(code: StatusCode) -> Self {
        Self::WrongAccess {
            code,
            access: "read-only",
        }
    }

    /// Create a write-only error for a get on a set-only code.
    #[must_use]
    pub fn write_only(code: StatusCode) -> Self {
        Self::WrongAccess {
            code,
            access: "write-only",
        }
    }
}

/// A specialized `Result` type for driver operations.
pub type DriverResult<T> = core::result::Result<T, DriverError>;
