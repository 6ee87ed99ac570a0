//! Unix implementation of the recorder's terminal plumbing.
//!
//! - PTY master/slave pair allocation via openpt/grantpt/unlockpt
//! - Async reads from the master through tokio's `AsyncFd`
//! - Shell spawning with session and controlling-terminal setup
//! - Raw mode for the recorder's own terminal
//! - Termination signal watching

mod child;
mod pty;
mod signals;
mod termios;

use std::ffi::OsStr;

pub use child::{UnixPtyChild, login_arg0, spawn_child};
pub use pty::{UnixPtyMaster, open_slave};
pub use signals::{SignalHandle, TerminationSignal, start_termination_watcher};
pub use termios::{RawModeFlags, RawModeGuard, TerminalState, query_window_size};

use crate::config::PtyConfig;
use crate::error::Result;

/// Factory for PTY sessions on Unix.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixPtySystem;

impl UnixPtySystem {
    /// Allocate a PTY, size it once and start `program` on its slave.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if allocation, sizing or spawning fails. Nothing is
    /// left running on failure.
    pub fn spawn<S, I>(
        program: S,
        args: I,
        config: &PtyConfig,
    ) -> Result<(UnixPtyMaster, UnixPtyChild)>
    where
        S: AsRef<OsStr>,
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        let (master, slave_path) = UnixPtyMaster::open()?;

        master.set_window_size(config.window_size.into())?;

        let slave_fd = open_slave(&slave_path)?;
        let child = spawn_child(slave_fd, program, args, config)?;

        Ok((master, child))
    }
}

/// The PTY system for this platform.
pub type NativePtySystem = UnixPtySystem;
