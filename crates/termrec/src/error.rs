//! Error types for termrec.
//!
//! Setup failures surface before the shell is spawned and leave nothing
//! behind. Failures after that point still restore the terminal, because the
//! raw-mode guard is dropped on every path out of a session.

use std::path::PathBuf;

use termrec_pty::{PtyError, TerminationSignal};
use thiserror::Error;

/// The main error type for recording operations.
#[derive(Debug, Error)]
pub enum RecordError {
    /// A PTY or terminal-attribute operation failed.
    #[error("terminal error: {0}")]
    Pty(#[from] PtyError),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An I/O error occurred with additional context.
    #[error("{context}: {source}")]
    IoWithContext {
        /// What operation was being performed.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The session could not be set up.
    #[error("setup failed: {reason}")]
    Setup {
        /// What went wrong.
        reason: String,
    },

    /// Reading the user's input or forwarding it to the shell failed.
    #[error("input relay failed: {0}")]
    Input(#[source] std::io::Error),

    /// Mirroring the shell's output failed.
    #[error("output relay failed: {0}")]
    Output(#[source] std::io::Error),

    /// The recorder was told to stop before the shell exited.
    #[error("interrupted by {signal}, recording discarded")]
    Interrupted {
        /// The signal that stopped the session.
        signal: TerminationSignal,
    },

    /// The recording could not be serialized or parsed.
    #[error("recording format error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A recording file did not carry the expected wrapper.
    #[error("malformed recording envelope: {message}")]
    Envelope {
        /// Description of what's wrong with the envelope.
        message: String,
    },

    /// The recording could not be written to its destination.
    #[error("failed to write recording to {}: {source}", path.display())]
    Persist {
        /// Destination path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Result type for recording operations.
pub type Result<T> = std::result::Result<T, RecordError>;

impl RecordError {
    /// Create a setup error.
    pub fn setup(reason: impl Into<String>) -> Self {
        Self::Setup {
            reason: reason.into(),
        }
    }

    /// Create an envelope error.
    pub fn envelope(message: impl Into<String>) -> Self {
        Self::Envelope {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io_context(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoWithContext {
            context: context.into(),
            source,
        }
    }

    /// Wrap an I/O result with context.
    pub fn with_io_context<T>(result: std::io::Result<T>, context: impl Into<String>) -> Result<T> {
        result.map_err(|e| Self::io_context(context, e))
    }

    /// Check if the session was stopped by a termination signal.
    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }

    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Interrupted { signal } => signal.exit_code(),
            _ => 1,
        }
    }
}
