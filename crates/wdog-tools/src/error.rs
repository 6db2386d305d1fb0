//! Error types and exit codes for the watchdog tools

use thiserror::Error;
use wdog_core::{ParamError, WdogError};

/// Exit code for bad parameters or usage.
pub const EXIT_PARAM: u8 = 1;

/// Exit code for failed driver operations.
pub const EXIT_FUNC: u8 = 2;

/// Failure of a tool run, mapped to its exit code.
#[derive(Error, Debug)]
pub enum CliError {
    /// Rejected option combination.
    #[error(transparent)]
    Param(#[from] ParamError),

    /// Failed driver call or signal setup.
    #[error(transparent)]
    Wdog(WdogError),

    /// Console output failed.
    #[error("console output failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<WdogError> for CliError {
    fn from(err: WdogError) -> Self {
        match err {
            WdogError::Param(param) => Self::Param(param),
            other => Self::Wdog(other),
        }
    }
}

impl CliError {
    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Param(_) => EXIT_PARAM,
            Self::Wdog(_) | Self::Io(_) => EXIT_FUNC,
        }
    }
}
