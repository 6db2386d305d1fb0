//! Operating system facade: delays and the non-blocking key poll.

use std::io::{self, IsTerminal};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal;

/// Millisecond delays.
pub trait Clock: Send + Sync {
    /// Block the calling thread for `ms` milliseconds.
    fn delay(&self, ms: u64);
}

/// Clock backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn delay(&self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

/// Non-blocking key poll.
pub trait KeyPoller {
    /// Return the pending key, or `None` if no key was pressed.
    fn poll_key(&mut self) -> Option<char>;
}

/// Key poll on the controlling terminal.
///
/// Raw mode is enabled only while polling so console output keeps its
/// normal line handling. When stdin is not a terminal no key is ever
/// reported.
#[derive(Debug)]
pub struct TerminalKeyPoller {
    interactive: bool,
}

impl TerminalKeyPoller {
    /// Create a poller for the process's stdin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            interactive: io::stdin().is_terminal(),
        }
    }
}

impl Default for TerminalKeyPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyPoller for TerminalKeyPoller {
    fn poll_key(&mut self) -> Option<char> {
        if !self.interactive {
            return None;
        }
        match poll_terminal() {
            Ok(key) => key,
            Err(err) => {
                tracing::debug!(error = %err, "key poll failed, treating as no key");
                None
            }
        }
    }
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(err) = terminal::disable_raw_mode() {
            tracing::warn!(error = %err, "failed to restore terminal mode");
        }
    }
}

fn poll_terminal() -> io::Result<Option<char>> {
    let _raw = RawModeGuard::enable()?;
    while event::poll(Duration::ZERO)? {
        if let Event::Key(KeyEvent {
            code,
            kind: KeyEventKind::Press,
            ..
        }) = event::read()?
        {
            let key = match code {
                KeyCode::Char(c) => c,
                KeyCode::Enter => '\n',
                KeyCode::Esc => '\u{1b}',
                _ => '?',
            };
            return Ok(Some(key));
        }
    }
    Ok(None)
}
