//! # wdog-core
//!
//! Trigger loop, interrupt reset path and status dump shared by the
//! watchdog tools.
//!
//! This crate provides:
//! - `LoopParams` validation into an immutable `LoopPlan`
//! - `TriggerLoop` with plain and alternating pattern triggers, a growing
//!   interval and key/pass-limit stop conditions
//! - `ControlState`, the state shared with the interrupt signal callback
//! - `SignalDispatcher`, OS signal delivery onto a handler thread
//! - `run_time_ramp` for measuring the effective watchdog time
//! - the info dump and single status queries with their decode tables
//!
//! ## Trigger Loop
//!
//! ```text
//! validate ──► open ──► prepare ──► start ──► pass* ──► stop ──► close
//!                                              │
//!              signal ──► ControlState::on_signal ──► reset (after delay)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use wdog_core::prelude::*;
//! use wdog_driver::SimDevice;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! struct NoKeys;
//! impl KeyPoller for NoKeys {
//!     fn poll_key(&mut self) -> Option<char> {
//!         None
//!     }
//! }
//!
//! let device = SimDevice::open("wdog_1")?;
//! let config = TriggerConfig::builder().interval_ms(1).abort_after(3).build()?;
//! let mut out = Vec::new();
//! let mut keys = NoKeys;
//! let mut io = LoopIo {
//!     clock: &SystemClock,
//!     keys: &mut keys,
//!     out: &mut out,
//! };
//! let outcome = TriggerLoop::new(&device, config).run(&mut io)?;
//! assert_eq!(outcome.passes, 3);
//! assert_eq!(outcome.stop_reason, Some(StopReason::PassLimit));
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

pub mod config;
pub mod dump;
pub mod error;
pub mod interrupt;
pub mod os;
pub mod prelude;
pub mod ramp;
pub mod signal;
pub mod trigger;

pub use config::{LoopParams, LoopPlan, ProgressStyle, TriggerConfig, TriggerMode};
pub use error::{DriverOp, DriverResultExt, ParamError, WdogError, WdogResult};
pub use interrupt::ControlState;
pub use os::{Clock, KeyPoller, SystemClock, TerminalKeyPoller};
pub use ramp::{ramp_step, run_time_ramp};
pub use signal::{IRQ_SIGNAL, SignalDispatcher, SignalSender};
pub use trigger::{LoopIo, LoopOutcome, PatternToggle, StopReason, TriggerLoop, TriggerState};
