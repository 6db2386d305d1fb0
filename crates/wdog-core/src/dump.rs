//! Status dump and single status queries.
//!
//! The dump reads every info code independently: a failed read is printed
//! on its own line and the remaining codes are still read. The single
//! queries used by `wdog_test` fail fast instead.

use std::io::{self, Write};

use wdog_driver::{SHOT_NOT_IDENTIFIABLE, StatusCode, WdogDevice};

use crate::error::{DriverOp, DriverResultExt, WdogResult};

/// Decoded `SHOT` value.
#[must_use]
pub fn shot_label(value: i32) -> &'static str {
    match value {
        0 => "no wdog shot",
        1 => "wdog shot",
        SHOT_NOT_IDENTIFIABLE => "not identifiable",
        _ => "*** illegal value",
    }
}

/// Decoded `OUT_REASON` value.
#[must_use]
pub fn out_reason_label(value: i32) -> &'static str {
    match value {
        0 => "not triggered",
        1 => "min timeout triggered",
        2 => "max timeout triggered",
        3 => "manually triggered",
        _ => "*** illegal value",
    }
}

/// Decoded `IRQ_REASON` value.
#[must_use]
pub fn irq_reason_label(value: i32) -> &'static str {
    match value {
        0 => "not triggered",
        2 => "irq timeout triggered",
        3 => "manually triggered",
        _ => "*** illegal value",
    }
}

fn enabled_label(value: i32) -> &'static str {
    if value != 0 { "enabled" } else { "disabled" }
}

fn pin_label(value: i32) -> &'static str {
    if value != 0 { "set" } else { "cleared" }
}

fn micros(value: i32) -> String {
    format!("{}ms ({value}us)", value / 1000)
}

/// One line of the info dump.
#[derive(Debug, Clone, Copy)]
pub struct InfoField {
    /// Code read for this line.
    pub code: StatusCode,
    /// Label column text.
    pub label: &'static str,
    render: fn(i32) -> String,
}

impl InfoField {
    const fn new(code: StatusCode, label: &'static str, render: fn(i32) -> String) -> Self {
        Self {
            code,
            label,
            render,
        }
    }

    /// Render a value read for this field.
    #[must_use]
    pub fn render(&self, value: i32) -> String {
        (self.render)(value)
    }
}

/// Width of the label column.
pub const LABEL_WIDTH: usize = 38;

/// Fields of the info dump in print order.
pub const INFO_FIELDS: [InfoField; 12] = [
    InfoField::new(StatusCode::Time, "WDOG_TIME (MAX time)", |v| format!("{v}ms")),
    InfoField::new(StatusCode::Status, "WDOG_STATUS (counter state)", |v| {
        enabled_label(v).to_owned()
    }),
    InfoField::new(StatusCode::Shot, "WDOG_SHOT (shot info)", |v| {
        shot_label(v).to_owned()
    }),
    InfoField::new(StatusCode::TrigPat, "WDOG_TRIG_PAT (last used pattern)", |v| {
        format!("0x{v:x}")
    }),
    InfoField::new(StatusCode::TimeMin, "WDOG_TIME_MIN (MIN time)", micros),
    InfoField::new(StatusCode::TimeMax, "WDOG_TIME_MAX (MAX time)", micros),
    InfoField::new(StatusCode::TimeIrq, "WDOG_TIME_IRQ (IRQ time)", |v| {
        format!("{} - may be cleared from drv-exit", micros(v))
    }),
    InfoField::new(StatusCode::OutPin, "WDOG_OUT_PIN (out pin)", |v| {
        pin_label(v).to_owned()
    }),
    InfoField::new(StatusCode::OutReason, "WDOG_OUT_REASON (last out pin reason)", |v| {
        out_reason_label(v).to_owned()
    }),
    InfoField::new(StatusCode::IrqPin, "WDOG_IRQ_PIN (irq pin)", |v| {
        pin_label(v).to_owned()
    }),
    InfoField::new(StatusCode::IrqReason, "WDOG_IRQ_REASON (last irq pin reason)", |v| {
        irq_reason_label(v).to_owned()
    }),
    InfoField::new(StatusCode::ErrPin, "WDOG_ERR_PIN (err pin)", |v| {
        pin_label(v).to_owned()
    }),
];

/// Print every info field.
///
/// Returns the number of codes that could not be read.
///
/// # Errors
///
/// Returns an error only if writing to `out` fails.
pub fn write_info(device: &dyn WdogDevice, out: &mut dyn Write) -> io::Result<usize> {
    let mut failed = 0;
    for field in &INFO_FIELDS {
        write!(out, "{:<LABEL_WIDTH$}: ", field.label)?;
        match device.get_status(field.code) {
            Ok(value) => writeln!(out, "{}", field.render(value))?,
            Err(err) => {
                tracing::warn!(code = %field.code, error = %err, "info read failed");
                failed += 1;
                writeln!(out, "*** error: {err}")?;
            }
        }
    }
    Ok(failed)
}

/// Print whether the watchdog is running.
///
/// # Errors
///
/// Returns an error if the status cannot be read or printed.
pub fn query_status(device: &dyn WdogDevice, out: &mut dyn Write) -> WdogResult<()> {
    let status = device
        .get_status(StatusCode::Status)
        .op(DriverOp::GetStat(StatusCode::Status))?;
    let state = if status != 0 { "active" } else { "inactive" };
    writeln!(out, "Watchdog is {state}")?;
    Ok(())
}

/// Print whether the watchdog caused the last system reset.
///
/// # Errors
///
/// Returns an error if the shot info cannot be read or printed.
pub fn query_shot(device: &dyn WdogDevice, out: &mut dyn Write) -> WdogResult<()> {
    let shot = device
        .get_status(StatusCode::Shot)
        .op(DriverOp::GetStat(StatusCode::Shot))?;
    let answer = match shot {
        0 => "NO",
        1 => "YES",
        SHOT_NOT_IDENTIFIABLE => "NOT IDENTIFIABLE",
        _ => "*** ERROR: DRIVER RETURNS AN ILLEGAL VALUE",
    };
    writeln!(out, "Did the watchdog initiates the last system reset ?")?;
    writeln!(out, " {answer}")?;
    Ok(())
}

/// Print the watchdog time.
///
/// # Errors
///
/// Returns an error if the time cannot be read or printed.
pub fn query_time(device: &dyn WdogDevice, out: &mut dyn Write) -> WdogResult<()> {
    let time = device
        .get_status(StatusCode::Time)
        .op(DriverOp::GetStat(StatusCode::Time))?;
    writeln!(out, "Watchdog time: {time}msec")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wdog_driver::SimDevice;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_decode_tables() {
        assert_eq!(shot_label(0), "no wdog shot");
        assert_eq!(shot_label(1), "wdog shot");
        assert_eq!(shot_label(255), "not identifiable");
        assert_eq!(shot_label(7), "*** illegal value");
        assert_eq!(out_reason_label(1), "min timeout triggered");
        assert_eq!(out_reason_label(4), "*** illegal value");
        assert_eq!(irq_reason_label(1), "*** illegal value");
        assert_eq!(irq_reason_label(2), "irq timeout triggered");
    }

    #[test]
    fn test_labels_fit_column() {
        for field in &INFO_FIELDS {
            assert!(field.label.len() < LABEL_WIDTH, "{}", field.label);
        }
    }

    #[test]
    fn test_time_irq_rendering() -> TestResult {
        let field = INFO_FIELDS
            .iter()
            .find(|f| f.code == StatusCode::TimeIrq)
            .ok_or("no TIME_IRQ field")?;
        assert_eq!(
            field.render(250_000),
            "250ms (250000us) - may be cleared from drv-exit"
        );
        Ok(())
    }

    #[test]
    fn test_failed_reads_do_not_stop_dump() -> TestResult {
        let dev = SimDevice::open("wdog_1")?;
        dev.close()?;
        let mut out = Vec::new();
        let failed = write_info(&dev, &mut out)?;
        assert_eq!(failed, INFO_FIELDS.len());
        let text = String::from_utf8(out)?;
        assert_eq!(text.lines().count(), 12);
        assert!(text.lines().all(|l| l.ends_with(": *** error: path closed")));
        Ok(())
    }

    #[test]
    fn test_single_queries() -> TestResult {
        let dev = SimDevice::open("wdog_1")?;
        dev.set_status(StatusCode::Time, 3000)?;
        let mut out = Vec::new();
        query_status(&dev, &mut out)?;
        query_shot(&dev, &mut out)?;
        query_time(&dev, &mut out)?;
        assert_eq!(
            String::from_utf8(out)?,
            "Watchdog is inactive\n\
             Did the watchdog initiates the last system reset ?\n\
             \x20NO\n\
             Watchdog time: 3000msec\n"
        );
        Ok(())
    }
}
