//! Shared test doubles for wdog-tools integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::sync::Arc;

use parking_lot::Mutex;
use wdog_core::os::{Clock, KeyPoller};
use wdog_driver::{DriverError, DriverResult, SimDevice, StatusCode, WdogDevice, WdogDriver};
use wdog_tools::session::ToolEnv;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Simulated device that can fail chosen calls and counts sets per code.
#[derive(Debug)]
pub struct FaultyDevice {
    inner: SimDevice,
    sets: Mutex<Vec<(StatusCode, i32)>>,
    fail_set: Mutex<Option<(StatusCode, usize)>>,
    fail_get: Mutex<Option<StatusCode>>,
}

impl FaultyDevice {
    pub fn new() -> Result<Arc<Self>, DriverError> {
        Ok(Arc::new(Self {
            inner: SimDevice::open("wdog_1")?,
            sets: Mutex::new(Vec::new()),
            fail_set: Mutex::new(None),
            fail_get: Mutex::new(None),
        }))
    }

    pub fn sim(&self) -> &SimDevice {
        &self.inner
    }

    /// Fail the `nth` (1-based) set of `code`.
    pub fn fail_nth_set(&self, code: StatusCode, nth: usize) {
        *self.fail_set.lock() = Some((code, nth));
    }

    /// Fail every get of `code`.
    pub fn fail_get(&self, code: StatusCode) {
        *self.fail_get.lock() = Some(code);
    }

    pub fn set_count(&self, code: StatusCode) -> usize {
        self.sets.lock().iter().filter(|(c, _)| *c == code).count()
    }

    pub fn set_values(&self, code: StatusCode) -> Vec<i32> {
        self.sets
            .lock()
            .iter()
            .filter(|(c, _)| *c == code)
            .map(|(_, v)| *v)
            .collect()
    }
}

impl WdogDevice for FaultyDevice {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn get_status(&self, code: StatusCode) -> DriverResult<i32> {
        if *self.fail_get.lock() == Some(code) {
            return Err(DriverError::DeviceState("injected failure"));
        }
        self.inner.get_status(code)
    }

    fn set_status(&self, code: StatusCode, value: i32) -> DriverResult<()> {
        self.sets.lock().push((code, value));
        let fail = *self.fail_set.lock();
        if let Some((fail_code, nth)) = fail
            && fail_code == code
            && self.set_count(code) == nth
        {
            return Err(DriverError::DeviceState("injected failure"));
        }
        self.inner.set_status(code, value)
    }

    fn close(&self) -> DriverResult<()> {
        self.inner.close()
    }
}

/// Driver handing out one prepared device under any name.
#[derive(Debug)]
pub struct FixedDriver(pub Arc<FaultyDevice>);

impl WdogDriver for FixedDriver {
    fn open(&self, _device: &str) -> DriverResult<Arc<dyn WdogDevice>> {
        Ok(Arc::clone(&self.0) as Arc<dyn WdogDevice>)
    }
}

/// Clock that records requested delays without sleeping.
#[derive(Debug, Default)]
pub struct RecordingClock {
    delays: Mutex<Vec<u64>>,
}

impl RecordingClock {
    pub fn delays(&self) -> Vec<u64> {
        self.delays.lock().clone()
    }
}

impl Clock for RecordingClock {
    fn delay(&self, ms: u64) {
        self.delays.lock().push(ms);
    }
}

/// Key poll that reports a key on a fixed poll.
#[derive(Debug)]
pub struct KeyAfter {
    remaining: Option<u64>,
}

impl KeyAfter {
    /// Report a key on poll number `polls` (1-based).
    pub fn polls(polls: u64) -> Self {
        Self {
            remaining: Some(polls),
        }
    }

    pub fn never() -> Self {
        Self { remaining: None }
    }
}

impl KeyPoller for KeyAfter {
    fn poll_key(&mut self) -> Option<char> {
        let remaining = self.remaining.as_mut()?;
        *remaining = remaining.saturating_sub(1);
        (*remaining == 0).then_some('q')
    }
}

/// Console text, with color escapes stripped.
pub fn text(out: &[u8]) -> Result<String, std::string::FromUtf8Error> {
    let raw = String::from_utf8(out.to_vec())?;
    let mut plain = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            for c in chars.by_ref() {
                if c == 'm' {
                    break;
                }
            }
        } else {
            plain.push(c);
        }
    }
    Ok(plain)
}

/// Build an environment over `driver`, `clock`, `keys` and `out`.
pub fn env<'a>(
    driver: &'a dyn WdogDriver,
    clock: Arc<RecordingClock>,
    keys: &'a mut KeyAfter,
    out: &'a mut Vec<u8>,
) -> ToolEnv<'a> {
    ToolEnv {
        driver,
        clock,
        keys,
        out,
        color: false,
    }
}
