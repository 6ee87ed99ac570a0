//! Diagnostic logging setup.
//!
//! Log lines written to standard error while the user's terminal is in raw
//! mode would land in the middle of the recorded screen without carriage
//! returns. [`hold_stderr`] queues them instead, and the queue is written out
//! once the terminal has been restored.

use std::fs::OpenOptions;
use std::io::{self, IsTerminal, Write};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{RecordError, Result};

/// Log output queued while standard error is held.
static HELD: Mutex<Option<Vec<u8>>> = Mutex::new(None);

/// Build the filter for `config`.
pub fn filter(config: &LoggingConfig) -> Result<EnvFilter> {
    EnvFilter::try_new(&config.filter)
        .map_err(|e| RecordError::config(format!("invalid log filter {:?}: {e}", config.filter)))
}

/// Install the global subscriber.
///
/// Logs go to the configured file, appending, or to standard error. Standard
/// output is left alone because it carries the recorded session.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = filter(config)?;

    let (writer, ansi) = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    RecordError::io_context(format!("opening log file {}", path.display()), e)
                })?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (
            BoxMakeWriter::new(|| HeldStderr),
            io::stderr().is_terminal(),
        ),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true);

    let installed = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| RecordError::config(format!("logging already initialized: {e}")))
}

/// Standard error, unless a [`StderrHold`] is active.
#[derive(Debug, Clone, Copy, Default)]
struct HeldStderr;

impl Write for HeldStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if queue(buf) {
            return Ok(buf.len());
        }
        io::stderr().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// Append `buf` to the held output. Returns `false` if nothing is held.
fn queue(buf: &[u8]) -> bool {
    let Ok(mut held) = HELD.lock() else {
        return false;
    };
    match held.as_mut() {
        Some(pending) => {
            pending.extend_from_slice(buf);
            true
        }
        None => false,
    }
}

/// Stop the release of queued output and return it.
fn take_held() -> Vec<u8> {
    HELD.lock()
        .ok()
        .and_then(|mut held| held.take())
        .unwrap_or_default()
}

/// Keeps log output off standard error until released or dropped.
#[derive(Debug)]
#[must_use = "log output is released when the hold is dropped"]
pub struct StderrHold {
    _private: (),
}

/// Queue log lines meant for standard error until the hold ends.
pub fn hold_stderr() -> StderrHold {
    if let Ok(mut held) = HELD.lock() {
        held.get_or_insert_with(Vec::new);
    }
    StderrHold { _private: () }
}

impl StderrHold {
    /// Write queued output to standard error now.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for StderrHold {
    fn drop(&mut self) {
        let pending = take_held();
        if !pending.is_empty() {
            let mut stderr = io::stderr().lock();
            let _ = stderr.write_all(&pending);
            let _ = stderr.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_filter_accepted() {
        let config = LoggingConfig::new().filter("termrec=debug,warn");
        assert!(filter(&config).is_ok());
    }

    #[test]
    fn invalid_filter_rejected() {
        let config = LoggingConfig::new().filter("termrec=loud");
        let err = filter(&config).unwrap_err();
        assert!(matches!(err, RecordError::Config { .. }));
    }

    #[test]
    fn unopenable_log_file_reported() {
        let config = LoggingConfig::new().log_file("/nonexistent-dir/termrec.log");
        let err = init_logging(&config).unwrap_err();
        assert!(err.to_string().contains("opening log file"));
    }

    #[test]
    fn held_output_is_queued_until_release() {
        assert!(!queue(b"before\n"));

        let hold = hold_stderr();
        assert!(queue(b"WARN first\n"));
        assert!(queue(b"ERROR second\n"));
        assert_eq!(
            HELD.lock().unwrap().as_deref(),
            Some(&b"WARN first\nERROR second\n"[..])
        );

        hold.release();
        assert!(HELD.lock().unwrap().is_none());
        assert!(!queue(b"after\n"));
    }
}
