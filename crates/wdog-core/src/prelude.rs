//! Prelude for wdog-core.
//!
//! Re-exports the types a tool needs to validate options and run a loop.

pub use crate::config::{LoopParams, LoopPlan, ProgressStyle, TriggerConfig, TriggerMode};
pub use crate::error::{DriverOp, ParamError, WdogError, WdogResult};
pub use crate::interrupt::ControlState;
pub use crate::os::{Clock, KeyPoller, SystemClock, TerminalKeyPoller};
pub use crate::signal::{IRQ_SIGNAL, SignalDispatcher};
pub use crate::trigger::{LoopIo, LoopOutcome, StopReason, TriggerLoop};
