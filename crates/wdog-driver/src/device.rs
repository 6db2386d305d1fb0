//! Device handle and driver traits.
//!
//! A watchdog device is reached through four primitives: open a handle by
//! name, read a status code, write a status code, close the handle.

use std::sync::Arc;

use crate::codes::StatusCode;
use crate::error::DriverResult;
use crate::linux::LinuxWatchdog;
use crate::sim::SimDevice;

/// An open handle to one watchdog instance.
///
/// Methods take `&self` because the handle is shared between the main
/// flow of a tool and its interrupt signal callback. Implementations
/// serialize access internally where the hardware requires it; callers
/// take no lock.
///
/// # Lifecycle
///
/// ```text
/// open(name) ──► get_status / set_status ... ──► close()
///                                                 │
///                                  every later call fails with `Closed`
/// ```
pub trait WdogDevice: Send + Sync {
    /// Device name the handle was opened with.
    fn name(&self) -> &str;

    /// Read the value of a status code.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is unsupported or write-only, the
    /// device cannot be reached, or the handle was closed.
    fn get_status(&self, code: StatusCode) -> DriverResult<i32>;

    /// Write a value to a status code.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is unsupported or read-only, the value
    /// is illegal, the device cannot be reached, or the handle was closed.
    fn set_status(&self, code: StatusCode, value: i32) -> DriverResult<()>;

    /// Close the handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle was already closed or releasing the
    /// device failed.
    fn close(&self) -> DriverResult<()>;
}

/// Opens device handles by name.
pub trait WdogDriver {
    /// Open a handle to the named device.
    ///
    /// # Errors
    ///
    /// Returns an error if the device does not exist or cannot be opened.
    fn open(&self, device: &str) -> DriverResult<Arc<dyn WdogDevice>>;
}

/// Driver used by the command-line tools.
///
/// Names starting with `/dev/` open the Linux watchdog character device of
/// that name; any other name opens a simulated device.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDriver;

impl SystemDriver {
    /// Create the system driver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl WdogDriver for SystemDriver {
    fn open(&self, device: &str) -> DriverResult<Arc<dyn WdogDevice>> {
        if device.starts_with("/dev/") {
            let dev = LinuxWatchdog::open(device)?;
            tracing::debug!(device, backend = "linux", "device opened");
            Ok(Arc::new(dev))
        } else {
            let dev = SimDevice::open(device)?;
            tracing::debug!(device, backend = "sim", "device opened");
            Ok(Arc::new(dev))
        }
    }
}
