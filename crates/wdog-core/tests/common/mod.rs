//! Shared test doubles for wdog-core integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use parking_lot::Mutex;
use wdog_core::os::{Clock, KeyPoller};
use wdog_driver::{DriverError, DriverResult, SimDevice, StatusCode, WdogDevice};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// One driver call seen by a `RecordingDevice`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Get(StatusCode),
    Set(StatusCode, i32),
    Close,
}

/// Simulated device that records every call and can fail the n-th set of
/// a code.
#[derive(Debug)]
pub struct RecordingDevice {
    inner: SimDevice,
    calls: Mutex<Vec<Call>>,
    fail_set: Mutex<Option<(StatusCode, usize)>>,
}

impl RecordingDevice {
    pub fn new() -> Result<Self, DriverError> {
        Ok(Self {
            inner: SimDevice::open("wdog_1")?,
            calls: Mutex::new(Vec::new()),
            fail_set: Mutex::new(None),
        })
    }

    pub fn sim(&self) -> &SimDevice {
        &self.inner
    }

    /// Fail the `nth` (1-based) set of `code`.
    pub fn fail_nth_set(&self, code: StatusCode, nth: usize) {
        *self.fail_set.lock() = Some((code, nth));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn set_count(&self, code: StatusCode) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, Call::Set(c2, _) if *c2 == code))
            .count()
    }

    pub fn set_values(&self, code: StatusCode) -> Vec<i32> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::Set(c2, v) if *c2 == code => Some(*v),
                _ => None,
            })
            .collect()
    }
}

impl WdogDevice for RecordingDevice {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn get_status(&self, code: StatusCode) -> DriverResult<i32> {
        self.calls.lock().push(Call::Get(code));
        self.inner.get_status(code)
    }

    fn set_status(&self, code: StatusCode, value: i32) -> DriverResult<()> {
        self.calls.lock().push(Call::Set(code, value));
        if let Some((fail_code, nth)) = *self.fail_set.lock()
            && fail_code == code
            && self.set_count(code) == nth
        {
            return Err(DriverError::DeviceState("injected failure"));
        }
        self.inner.set_status(code, value)
    }

    fn close(&self) -> DriverResult<()> {
        self.calls.lock().push(Call::Close);
        self.inner.close()
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

/// Key poll that reports a key after a fixed number of polls.
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
