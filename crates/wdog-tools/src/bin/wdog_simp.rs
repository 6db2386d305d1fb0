//! Minimal watchdog example: trigger until keypress, then let the watchdog reset.

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(err) = wdog_tools::logging::init() {
        eprintln!("warning: {err:#}");
    }
    wdog_tools::simp::main_entry(std::env::args_os())
}
