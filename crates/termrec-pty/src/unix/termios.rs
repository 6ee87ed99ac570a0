//! Terminal attribute control for the recorder's own terminal.
//!
//! The recorder sits between the user's terminal and the shell's PTY, so the
//! real terminal has to be put into a transparent raw mode for the whole
//! session: every byte the user types reaches the PTY master unchanged, and
//! every byte the shell prints reaches the screen unchanged. The slave side
//! of the PTY keeps its normal line discipline, which is where line editing,
//! echo and job-control signals happen for the shell.
//!
//! The original attributes are captured exactly once, before any change, and
//! are the only state ever written back.

use std::os::unix::io::{AsFd, AsRawFd, OwnedFd};

use rustix::termios::{
    ControlModes, InputModes, LocalModes, OptionalActions, OutputModes, SpecialCodeIndex, Termios,
    isatty, tcgetattr, tcgetwinsize, tcsetattr,
};

use super::pty::from_winsize;
use crate::config::WindowSize;
use crate::error::{PtyError, Result, errno_to_io};

/// The attribute changes that make up the recorder's raw mode.
///
/// Computed once at startup and passed explicitly to [`RawModeGuard::enter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawModeFlags {
    /// Input bits to clear (break, parity, strip and CR/NL translation, flow control).
    pub input_clear: InputModes,
    /// Output bits to clear (post-processing).
    pub output_clear: OutputModes,
    /// Local bits to clear (canonical mode, echo, signal keys, extensions).
    pub local_clear: LocalModes,
    /// Control bits to clear (character size, parity).
    pub control_clear: ControlModes,
    /// Control bits to set (8-bit characters).
    pub control_set: ControlModes,
    /// `VMIN`: bytes a read waits for.
    pub min_bytes: u8,
    /// `VTIME`: inter-byte timer in tenths of a second, 0 disables it.
    pub read_timer: u8,
}

impl RawModeFlags {
    /// The raw mode used for recording sessions.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            input_clear: InputModes::IGNBRK
                | InputModes::BRKINT
                | InputModes::PARMRK
                | InputModes::ISTRIP
                | InputModes::INLCR
                | InputModes::IGNCR
                | InputModes::ICRNL
                | InputModes::IXON,
            output_clear: OutputModes::OPOST,
            local_clear: LocalModes::ECHO
                | LocalModes::ECHONL
                | LocalModes::ICANON
                | LocalModes::ISIG
                | LocalModes::IEXTEN,
            control_clear: ControlModes::CSIZE | ControlModes::PARENB,
            control_set: ControlModes::CS8,
            min_bytes: 1,
            read_timer: 0,
        }
    }

    /// Input modes after raw mode is applied.
    #[must_use]
    pub fn raw_input(&self, modes: InputModes) -> InputModes {
        modes.difference(self.input_clear)
    }

    /// Output modes after raw mode is applied.
    #[must_use]
    pub fn raw_output(&self, modes: OutputModes) -> OutputModes {
        modes.difference(self.output_clear)
    }

    /// Local modes after raw mode is applied.
    #[must_use]
    pub fn raw_local(&self, modes: LocalModes) -> LocalModes {
        modes.difference(self.local_clear)
    }

    /// Control modes after raw mode is applied.
    #[must_use]
    pub fn raw_control(&self, modes: ControlModes) -> ControlModes {
        modes.difference(self.control_clear).union(self.control_set)
    }

    /// Derive the raw attribute set from a snapshot, leaving the snapshot untouched.
    #[must_use]
    pub fn apply(&self, original: &Termios) -> Termios {
        let mut raw = original.clone();
        raw.input_modes = self.raw_input(raw.input_modes);
        raw.output_modes = self.raw_output(raw.output_modes);
        raw.local_modes = self.raw_local(raw.local_modes);
        raw.control_modes = self.raw_control(raw.control_modes);
        raw.special_codes[SpecialCodeIndex::VMIN] = self.min_bytes;
        raw.special_codes[SpecialCodeIndex::VTIME] = self.read_timer;
        raw
    }
}

impl Default for RawModeFlags {
    fn default() -> Self {
        Self::standard()
    }
}

/// A snapshot of a terminal's attributes, bound to that terminal.
pub struct TerminalState {
    /// Private duplicate of the terminal descriptor.
    fd: OwnedFd,
    /// Attributes captured before any modification.
    original: Termios,
}

impl std::fmt::Debug for TerminalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalState")
            .field("fd", &self.fd.as_raw_fd())
            .finish_non_exhaustive()
    }
}

impl TerminalState {
    /// Capture the current attributes of the terminal behind `fd`.
    ///
    /// # Errors
    ///
    /// Returns [`PtyError::NotATerminal`] if `fd` is not a terminal and
    /// [`PtyError::GetAttributes`] if the attributes cannot be read.
    pub fn capture<Fd: AsFd>(fd: Fd) -> Result<Self> {
        let fd = fd.as_fd();
        if !isatty(fd) {
            return Err(PtyError::NotATerminal {
                fd: fd.as_raw_fd(),
            });
        }

        let fd = rustix::io::fcntl_dupfd_cloexec(fd, 0)
            .map_err(|e| PtyError::GetAttributes(errno_to_io(e)))?;
        let original = tcgetattr(&fd).map_err(|e| PtyError::GetAttributes(errno_to_io(e)))?;

        Ok(Self { fd, original })
    }

    /// The captured attributes.
    #[must_use]
    pub const fn original(&self) -> &Termios {
        &self.original
    }

    /// Write the captured attributes back to the terminal.
    pub fn restore(&self) -> Result<()> {
        tcsetattr(&self.fd, OptionalActions::Now, &self.original)
            .map_err(|e| PtyError::SetAttributes(errno_to_io(e)))
    }
}

/// Keeps a terminal in raw mode until dropped.
///
/// Dropping the guard restores the attributes captured on entry, so the
/// terminal is returned to its original state on every exit path, including
/// early returns and panics.
#[derive(Debug)]
pub struct RawModeGuard {
    state: TerminalState,
    restored: bool,
}

impl RawModeGuard {
    /// Capture the terminal's attributes and switch it to raw mode.
    ///
    /// On failure the terminal is left untouched.
    pub fn enter<Fd: AsFd>(fd: Fd, flags: &RawModeFlags) -> Result<Self> {
        let state = TerminalState::capture(fd)?;
        let raw = flags.apply(state.original());

        tcsetattr(&state.fd, OptionalActions::Now, &raw)
            .map_err(|e| PtyError::SetAttributes(errno_to_io(e)))?;

        tracing::debug!(fd = state.fd.as_raw_fd(), "terminal switched to raw mode");

        Ok(Self {
            state,
            restored: false,
        })
    }

    /// The attributes that will be restored.
    #[must_use]
    pub const fn original(&self) -> &Termios {
        self.state.original()
    }

    /// Restore the original attributes now, reporting failure.
    pub fn restore(mut self) -> Result<()> {
        self.restored = true;
        self.state.restore()
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;
        match self.state.restore() {
            Ok(()) => tracing::debug!("terminal attributes restored"),
            Err(e) => tracing::error!(error = %e, "failed to restore terminal attributes"),
        }
    }
}

/// Query the window size of the terminal behind `fd`.
pub fn query_window_size<Fd: AsFd>(fd: Fd) -> Result<WindowSize> {
    let winsize = tcgetwinsize(fd).map_err(|e| PtyError::GetAttributes(errno_to_io(e)))?;

    Ok(from_winsize(&winsize))
}
