//! # wdog-driver
//!
//! Driver facade for WDOG profile watchdog devices.
//!
//! This crate provides the four primitives every watchdog tool is built on:
//! - `WdogDriver::open()` to obtain a device handle by name
//! - `WdogDevice::get_status()` / `WdogDevice::set_status()` on a `StatusCode`
//! - `WdogDevice::close()` to release the handle
//!
//! Two backends implement the handle:
//! - `SimDevice`, an in-memory watchdog with min/max/irq timers, used for
//!   tests and for any device name outside `/dev`
//! - `LinuxWatchdog`, the kernel `/dev/watchdogN` interface
//!
//! ## Example
//!
//! ```rust
//! use wdog_driver::prelude::*;
//!
//! # fn main() -> Result<(), DriverError> {
//! let device = SystemDriver::new().open("wdog_1")?;
//! device.set_status(StatusCode::Start, 0)?;
//! device.set_status(StatusCode::Trig, 0)?;
//! device.set_status(StatusCode::Stop, 0)?;
//! assert_eq!(device.get_status(StatusCode::Status)?, 0);
//! device.close()?;
//! # Ok(())
//! # }
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]

pub mod codes;
pub mod device;
pub mod error;
pub mod linux;
pub mod prelude;
pub mod sim;

pub use codes::{SHOT_NOT_IDENTIFIABLE, StatusCode, TRIG_PAT_A, TRIG_PAT_B, TRIG_PAT_TOGGLE};
pub use device::{SystemDriver, WdogDevice, WdogDriver};
pub use error::{DriverError, DriverResult};
pub use linux::LinuxWatchdog;
pub use sim::{SimDevice, SimSnapshot};
