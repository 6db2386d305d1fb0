//! Asynchronous signal dispatch.
//!
//! OS signals are caught by signal-hook on a forwarding thread and pushed
//! into a single-slot channel with `try_send`. One handler thread drains
//! the channel and runs the registered callback, so the callback never
//! runs in signal context and the main flow never waits on it. A signal
//! arriving while the previous one is still queued is coalesced.
//!
//! The handler thread also watches a stop channel owned by the
//! dispatcher, so `exit` returns even while `SignalSender` clones are
//! still alive. Those clones fail to deliver afterwards.
//!
//! ```text
//! OS ──► forwarder (per signal) ──try_send──► [slot] ──► handler thread ──► callback
//! ```

use std::thread::JoinHandle;

use crossbeam::channel::{self, Sender, TrySendError};

use crate::error::{WdogError, WdogResult};

/// Signal the watchdog interrupt is bound to.
#[cfg(unix)]
pub const IRQ_SIGNAL: i32 = signal_hook::consts::SIGUSR1;

/// Signal the watchdog interrupt is bound to.
#[cfg(not(unix))]
pub const IRQ_SIGNAL: i32 = 10;

/// Delivers a signal number to the handler thread.
#[derive(Debug, Clone)]
pub struct SignalSender {
    tx: Sender<i32>,
}

impl SignalSender {
    /// Queue `signal` without blocking.
    ///
    /// Returns `false` if a signal is already pending or the dispatcher
    /// has exited.
    pub fn deliver(&self, signal: i32) -> bool {
        match self.tx.try_send(signal) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::debug!(signal, "signal already pending, coalesced");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

#[derive(Debug)]
struct Installed {
    signal: i32,
    #[cfg(unix)]
    handle: signal_hook::iterator::Handle,
    forwarder: JoinHandle<()>,
}

/// Process-wide signal registration around one callback.
///
/// Dropping the dispatcher removes every installed signal and stops the
/// handler thread.
#[derive(Debug)]
pub struct SignalDispatcher {
    sender: Option<SignalSender>,
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
    installed: Vec<Installed>,
}

impl SignalDispatcher {
    /// Start the handler thread running `handler` for every delivery.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn init<F>(handler: F) -> WdogResult<Self>
    where
        F: Fn(i32) + Send + 'static,
    {
        let (tx, rx) = channel::bounded::<i32>(1);
        let (stop_tx, stop_rx) = channel::bounded::<()>(0);
        let worker = std::thread::Builder::new()
            .name("wdog-signal".into())
            .spawn(move || {
                loop {
                    channel::select! {
                        recv(rx) -> signal => match signal {
                            Ok(signal) => handler(signal),
                            Err(_) => break,
                        },
                        recv(stop_rx) -> _ => break,
                    }
                }
                tracing::debug!("signal handler thread stopped");
            })
            .map_err(WdogError::Signal)?;
        Ok(Self {
            sender: Some(SignalSender { tx }),
            stop: Some(stop_tx),
            worker: Some(worker),
            installed: Vec::new(),
        })
    }

    /// Sender for delivering signals without going through the OS.
    #[must_use]
    pub fn sender(&self) -> Option<SignalSender> {
        self.sender.clone()
    }

    /// Signals currently installed.
    #[must_use]
    pub fn installed(&self) -> Vec<i32> {
        self.installed.iter().map(|i| i.signal).collect()
    }

    /// Catch `signal` and forward it to the handler.
    ///
    /// # Errors
    ///
    /// Returns an error if the dispatcher has exited, the signal cannot be
    /// registered, or the platform has no signal support.
    #[cfg(unix)]
    pub fn install(&mut self, signal: i32) -> WdogResult<()> {
        if self.installed.iter().any(|i| i.signal == signal) {
            return Ok(());
        }
        let sender = self.sender.clone().ok_or_else(|| {
            WdogError::Signal(std::io::Error::other("signal dispatcher has exited"))
        })?;
        let mut signals =
            signal_hook::iterator::Signals::new([signal]).map_err(WdogError::Signal)?;
        let handle = signals.handle();
        let forwarder = std::thread::Builder::new()
            .name(format!("wdog-sig{signal}"))
            .spawn(move || {
                for caught in signals.forever() {
                    tracing::trace!(signal = caught, "signal caught");
                    let _queued = sender.deliver(caught);
                }
            })
            .map_err(WdogError::Signal)?;
        tracing::debug!(signal, "signal installed");
        self.installed.push(Installed {
            signal,
            handle,
            forwarder,
        });
        Ok(())
    }

    /// Catch `signal` and forward it to the handler.
    ///
    /// # Errors
    ///
    /// Always fails: the platform has no signal support.
    #[cfg(not(unix))]
    pub fn install(&mut self, signal: i32) -> WdogResult<()> {
        tracing::debug!(signal, "signal install requested");
        Err(WdogError::Signal(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "signals are not supported on this platform",
        )))
    }

    /// Stop catching `signal`. Unknown signals are ignored.
    pub fn remove(&mut self, signal: i32) {
        let Some(pos) = self.installed.iter().position(|i| i.signal == signal) else {
            return;
        };
        let installed = self.installed.swap_remove(pos);
        #[cfg(unix)]
        installed.handle.close();
        if installed.forwarder.join().is_err() {
            tracing::error!(signal, "signal forwarder thread panicked");
        }
        tracing::debug!(signal, "signal removed");
    }

    /// Remove every signal and stop the handler thread.
    pub fn exit(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let signals = self.installed();
        for signal in signals {
            self.remove(signal);
        }
        self.sender = None;
        // Dropping the stop sender disconnects the stop channel.
        self.stop = None;
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::error!("signal handler thread panicked");
        }
    }
}

impl Drop for SignalDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn wait_for(counter: &AtomicU32, expected: u32) {
        for _ in 0..400 {
            if counter.load(Ordering::Acquire) >= expected {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_direct_delivery_runs_handler() -> TestResult {
        let seen = Arc::new(AtomicU32::new(0));
        let seen_in_handler = Arc::clone(&seen);
        let dispatcher = SignalDispatcher::init(move |_| {
            seen_in_handler.fetch_add(1, Ordering::AcqRel);
        })?;
        let sender = dispatcher.sender().ok_or("dispatcher has no sender")?;
        assert!(sender.deliver(IRQ_SIGNAL));
        wait_for(&seen, 1);
        assert_eq!(seen.load(Ordering::Acquire), 1);
        dispatcher.exit();
        assert!(!sender.deliver(IRQ_SIGNAL));
        Ok(())
    }

    #[test]
    fn test_exit_returns_while_sender_alive() -> TestResult {
        let dispatcher = SignalDispatcher::init(|_| {})?;
        let sender = dispatcher.sender().ok_or("dispatcher has no sender")?;
        assert!(sender.deliver(IRQ_SIGNAL));

        let (done_tx, done_rx) = channel::bounded::<()>(1);
        std::thread::spawn(move || {
            dispatcher.exit();
            let _sent = done_tx.send(());
        });
        done_rx.recv_timeout(Duration::from_secs(3))?;

        assert!(!sender.deliver(IRQ_SIGNAL));
        Ok(())
    }

    #[test]
    fn test_drop_returns_while_sender_alive() -> TestResult {
        let dispatcher = SignalDispatcher::init(|_| {})?;
        let sender = dispatcher.sender().ok_or("dispatcher has no sender")?;

        let (done_tx, done_rx) = channel::bounded::<()>(1);
        std::thread::spawn(move || {
            drop(dispatcher);
            let _sent = done_tx.send(());
        });
        done_rx.recv_timeout(Duration::from_secs(3))?;

        assert!(!sender.deliver(IRQ_SIGNAL));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_os_signal_reaches_handler() -> TestResult {
        let seen = Arc::new(AtomicU32::new(0));
        let seen_in_handler = Arc::clone(&seen);
        let mut dispatcher = SignalDispatcher::init(move |signal| {
            if signal == IRQ_SIGNAL {
                seen_in_handler.fetch_add(1, Ordering::AcqRel);
            }
        })?;
        dispatcher.install(IRQ_SIGNAL)?;
        assert_eq!(dispatcher.installed(), vec![IRQ_SIGNAL]);

        signal_hook::low_level::raise(IRQ_SIGNAL)?;
        wait_for(&seen, 1);
        assert_eq!(seen.load(Ordering::Acquire), 1);

        dispatcher.remove(IRQ_SIGNAL);
        assert!(dispatcher.installed().is_empty());
        Ok(())
    }
}
