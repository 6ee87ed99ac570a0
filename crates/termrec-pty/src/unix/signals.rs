//! Termination signal watching for the recorder.
//!
//! With the terminal in raw mode the keyboard no longer generates signals,
//! but the recorder can still be told to stop from outside (`kill`, a closed
//! terminal window). Those signals are turned into events on a channel so the
//! session can hang up the shell and restore the terminal instead of dying
//! with it in raw mode.

use std::io;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use tokio::sync::mpsc;

/// A request from outside to stop recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    /// SIGINT.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// SIGHUP, the controlling terminal went away.
    Hangup,
    /// SIGQUIT.
    Quit,
}

impl TerminationSignal {
    /// Every signal the watcher listens for.
    pub const ALL: [i32; 4] = [SIGINT, SIGTERM, SIGHUP, SIGQUIT];

    /// Map a raw signal number.
    #[must_use]
    pub const fn from_raw(signal: i32) -> Option<Self> {
        match signal {
            SIGINT => Some(Self::Interrupt),
            SIGTERM => Some(Self::Terminate),
            SIGHUP => Some(Self::Hangup),
            SIGQUIT => Some(Self::Quit),
            _ => None,
        }
    }

    /// The raw signal number.
    #[must_use]
    pub const fn as_raw(self) -> i32 {
        match self {
            Self::Interrupt => SIGINT,
            Self::Terminate => SIGTERM,
            Self::Hangup => SIGHUP,
            Self::Quit => SIGQUIT,
        }
    }

    /// Conventional exit code for a process stopped by this signal.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        128 + self.as_raw()
    }
}

impl std::fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
            Self::Hangup => "SIGHUP",
            Self::Quit => "SIGQUIT",
        };
        f.write_str(name)
    }
}

/// Keeps the watcher thread alive. Dropping it stops the watcher.
#[derive(Debug)]
pub struct SignalHandle {
    handle: Handle,
}

impl SignalHandle {
    /// Stop watching. The event channel closes once the thread exits.
    pub fn shutdown(&self) {
        self.handle.close();
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.handle.is_closed()
    }
}

impl Drop for SignalHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Start a background thread that reports termination signals.
///
/// # Errors
///
/// Returns an error if signal registration or thread creation fails.
pub fn start_termination_watcher()
-> io::Result<(mpsc::UnboundedReceiver<TerminationSignal>, SignalHandle)> {
    let mut signals = Signals::new(TerminationSignal::ALL)?;
    let handle = signals.handle();
    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::Builder::new()
        .name("termrec-signals".into())
        .spawn(move || {
            for signal in signals.forever() {
                let Some(event) = TerminationSignal::from_raw(signal) else {
                    continue;
                };
                tracing::debug!(signal = %event, "termination signal received");
                if tx.send(event).is_err() {
                    break;
                }
            }
        })?;

    Ok((rx, SignalHandle { handle }))
}
