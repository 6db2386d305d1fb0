//! Prelude for wdog-driver.
//!
//! Re-exports the types needed to open a device and talk to it.

pub use crate::codes::{StatusCode, TRIG_PAT_A, TRIG_PAT_B};
pub use crate::device::{SystemDriver, WdogDevice, WdogDriver};
pub use crate::error::{DriverError, DriverResult};
pub use crate::sim::SimDevice;
