//! `wdog_ctrl`: control tool for WDOG profile drivers.
//!
//! Steps run in a fixed order; a failing setup step skips the rest of the
//! setup and goes straight to cleanup. Cleanup always clears the interrupt
//! binding (if one was made) and closes the device.

use std::ffi::OsString;
use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{ArgAction, ArgGroup, Parser};
use wdog_core::dump::write_info;
use wdog_core::{
    ControlState, DriverOp, DriverResultExt, IRQ_SIGNAL, LoopParams, LoopPlan, SignalDispatcher,
    WdogError,
};
use wdog_driver::{StatusCode, WdogDevice};

use crate::error::CliError;
use crate::output::print_line;
use crate::session::{ToolEnv, close_device, drive_trigger_loop, open_device};
use crate::{MAX_TIME_MS, parse_args};

/// Command line of `wdog_ctrl`.
#[derive(Debug, Parser)]
#[command(name = "wdog_ctrl")]
#[command(about = "Control tool for WDOG profile drivers (e.g. Z47)")]
#[command(disable_help_flag = true)]
#[command(group(ArgGroup::new("action").required(true).multiple(true)))]
pub struct CtrlArgs {
    /// Device name (e.g. wdog_1)
    pub device: String,

    /// Get watchdog info
    #[arg(short = 'g', group = "action")]
    pub get: bool,

    /// Reset wdog (counter, output/irq pin)
    #[arg(short = 'r', group = "action")]
    pub reset: bool,

    /// Clear reason of last output/irq pin assertion
    #[arg(short = 'c', group = "action")]
    pub clear: bool,

    /// Set wdog max/upper time [ms], 0 disables the upper limit
    #[arg(short = 'u', value_name = "ms", group = "action",
          value_parser = clap::value_parser!(u32).range(0..=MAX_TIME_MS))]
    pub max_time: Option<u32>,

    /// Set wdog min/lower time [ms], 0 disables the lower limit
    #[arg(short = 'l', value_name = "ms", group = "action",
          value_parser = clap::value_parser!(u32).range(0..=MAX_TIME_MS))]
    pub min_time: Option<u32>,

    /// Set wdog irq time [ms], 0 disables the irq usage
    #[arg(short = 'q', value_name = "ms", group = "action",
          value_parser = clap::value_parser!(u32).range(0..=MAX_TIME_MS))]
    pub irq_time: Option<u32>,

    /// 0=clear, 1=set output pin
    #[arg(short = 'o', value_name = "0,1", group = "action",
          value_parser = clap::value_parser!(u8).range(0..=1))]
    pub out_pin: Option<u8>,

    /// 0=clear, 1=set irq pin
    #[arg(short = 'i', value_name = "0,1", group = "action",
          value_parser = clap::value_parser!(u8).range(0..=1))]
    pub irq_pin: Option<u8>,

    /// 0=clear, 1=set error pin
    #[arg(short = 'e', value_name = "0,1", group = "action",
          value_parser = clap::value_parser!(u8).range(0..=1))]
    pub err_pin: Option<u8>,

    /// Start wdog, trigger all <ms> until keypress, stop wdog
    #[arg(short = 'T', value_name = "ms", group = "action",
          value_parser = clap::value_parser!(u32).range(0..=MAX_TIME_MS))]
    pub trigger: Option<u32>,

    /// Same as -T but trigger with alternating pattern
    #[arg(short = 'P', value_name = "ms", group = "action",
          value_parser = clap::value_parser!(u32).range(0..=MAX_TIME_MS))]
    pub pattern: Option<u32>,

    /// Increment trigger time at each loop pass [0]
    #[arg(short = 'I', value_name = "ms", group = "action",
          value_parser = clap::value_parser!(u32).range(0..=MAX_TIME_MS))]
    pub increment: Option<u32>,

    /// Reset wdog at irq signal after <ms>
    #[arg(short = 'R', value_name = "ms", group = "action",
          value_parser = clap::value_parser!(u32).range(0..=MAX_TIME_MS))]
    pub reset_delay: Option<u32>,

    /// Abort after n passes
    #[arg(short = 'A', value_name = "n", group = "action")]
    pub abort_after: Option<u32>,

    /// Verbose output
    #[arg(short = 'V', group = "action")]
    pub verbose: bool,

    /// Print usage
    #[arg(short = '?', long = "help", action = ArgAction::Help)]
    pub help: Option<bool>,
}

impl CtrlArgs {
    /// Loop-related options.
    #[must_use]
    pub fn loop_params(&self) -> LoopParams {
        LoopParams {
            trigger_ms: self.trigger,
            pattern_ms: self.pattern,
            increment_ms: self.increment.unwrap_or(0),
            reset_delay_ms: self.reset_delay,
            irq_time_ms: self.irq_time,
            abort_after: self.abort_after,
            verbose: self.verbose,
        }
    }
}

/// Signal dispatch plus the device binding made for it.
struct IrqBinding {
    dispatcher: SignalDispatcher,
    bound: bool,
}

impl IrqBinding {
    fn release(self, env: &mut ToolEnv<'_>, device: &dyn WdogDevice) -> Result<(), WdogError> {
        let mut result = Ok(());
        if self.bound {
            result = device
                .set_status(StatusCode::IrqSigClr, IRQ_SIGNAL)
                .op(DriverOp::SetStat(StatusCode::IrqSigClr));
            if let Err(err) = &result {
                env.report(err);
            }
        }
        self.dispatcher.exit();
        result
    }
}

/// Parse `args` and run the tool against the system environment.
pub fn main_entry<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = match parse_args::<CtrlArgs, _, _>(args) {
        Ok(args) => args,
        Err(code) => return code,
    };
    crate::session::with_system_env(|env| match run(&args, env) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(err.exit_code()),
    })
}

/// Run `wdog_ctrl`.
///
/// Every failure is printed where it happens.
///
/// # Errors
///
/// Returns the failure deciding the exit code: a parameter error, a failed
/// open or setup step, or a failed cleanup step.
pub fn run(args: &CtrlArgs, env: &mut ToolEnv<'_>) -> Result<(), CliError> {
    let plan = args.loop_params().validate().map_err(|err| {
        env.report(&err);
        CliError::from(err)
    })?;

    let device = open_device(env, &args.device)?;
    let mut irq = None;
    let mut result = configure_and_loop(args, &plan, &device, env, &mut irq);

    if let Some(binding) = irq
        && let Err(err) = binding.release(env, &*device)
    {
        result = Err(err);
    }
    if let Err(err) = close_device(env, &*device) {
        result = Err(err);
    }
    result.map_err(CliError::from)
}

fn configure_and_loop(
    args: &CtrlArgs,
    plan: &LoopPlan,
    device: &Arc<dyn WdogDevice>,
    env: &mut ToolEnv<'_>,
    irq: &mut Option<IrqBinding>,
) -> Result<(), WdogError> {
    let dev = &**device;

    if args.reset {
        set_stat(env, dev, StatusCode::ResetCtrl, 0)?;
    }

    if args.clear {
        let out_reason = set_stat(env, dev, StatusCode::OutReason, 0);
        let irq_reason = set_stat(env, dev, StatusCode::IrqReason, 0);
        out_reason.and(irq_reason)?;
    }

    if let Some(ms) = args.max_time {
        let us = ms_to_us(ms);
        if set_stat(env, dev, StatusCode::TimeMax, us).is_err() {
            set_stat(env, dev, StatusCode::Time, ms_to_i32(ms))?;
            print_line(env.out, &"max time set with older setstat code WDOG_TIME");
        }
    }
    if let Some(ms) = args.min_time {
        set_stat(env, dev, StatusCode::TimeMin, ms_to_us(ms))?;
    }
    if let Some(ms) = args.irq_time {
        set_stat(env, dev, StatusCode::TimeIrq, ms_to_us(ms))?;
    }

    for (pin, code) in [
        (args.out_pin, StatusCode::OutPin),
        (args.irq_pin, StatusCode::IrqPin),
        (args.err_pin, StatusCode::ErrPin),
    ] {
        if let Some(value) = pin {
            set_stat(env, dev, code, i32::from(value))?;
        }
    }

    if args.irq_time.is_some() {
        let state = Arc::new(ControlState::new(
            Arc::clone(device),
            Arc::clone(&env.clock),
            IRQ_SIGNAL,
            plan.reset_delay_ms,
        ));
        let handler_state = Arc::clone(&state);
        let installed = SignalDispatcher::init(move |signal| {
            handler_state.on_signal(signal, &mut io::stdout());
        })
        .and_then(|mut dispatcher| {
            dispatcher.install(IRQ_SIGNAL)?;
            Ok(dispatcher)
        });
        let dispatcher = installed.inspect_err(|err| env.report(err))?;
        let binding = irq.insert(IrqBinding {
            dispatcher,
            bound: false,
        });

        set_stat(env, dev, StatusCode::IrqSigSet, IRQ_SIGNAL)?;
        binding.bound = true;
        set_stat(env, dev, StatusCode::IrqEnable, 1)?;
        tracing::info!(signal = IRQ_SIGNAL, ?state, "interrupt signal bound");
    }

    if args.get {
        write_info(&**device, env.out)?;
    }

    match plan.trigger {
        Some(config) => drive_trigger_loop(env, &**device, config),
        None => Ok(()),
    }
}

fn set_stat(
    env: &mut ToolEnv<'_>,
    device: &dyn WdogDevice,
    code: StatusCode,
    value: i32,
) -> Result<(), WdogError> {
    device
        .set_status(code, value)
        .op(DriverOp::SetStat(code))
        .inspect_err(|err| env.report(err))
}

fn ms_to_us(ms: u32) -> i32 {
    ms_to_i32(ms).saturating_mul(1000)
}

fn ms_to_i32(ms: u32) -> i32 {
    i32::try_from(ms).unwrap_or(i32::MAX)
}
