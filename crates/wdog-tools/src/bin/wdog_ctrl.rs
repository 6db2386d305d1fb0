//! Control tool for WDOG profile watchdog drivers.

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(err) = wdog_tools::logging::init() {
        eprintln!("warning: {err:#}");
    }
    wdog_tools::ctrl::main_entry(std::env::args_os())
}
