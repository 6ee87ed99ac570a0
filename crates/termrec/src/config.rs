//! Configuration types for termrec.
//!
//! [`RecordConfig`] gathers everything a recording run needs: where the
//! recording goes, how the shell is started, read sizes and logging. Values
//! come from the command line and from `TERMREC_*` environment variables.

pub mod env;

use std::path::PathBuf;

pub use env::EnvConfig;

use crate::error::{RecordError, Result};
use crate::shell::ShellCommand;
use crate::transcript::Envelope;

/// Default recording file name.
pub const DEFAULT_OUTPUT: &str = "terminal.record";

/// Default read size for both relay directions.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default log filter.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Configuration for a recording run.
#[derive(Debug, Clone)]
pub struct RecordConfig {
    /// Where the recording is written.
    pub output: PathBuf,

    /// The shell to record.
    pub shell: ShellCommand,

    /// Maximum bytes per read on either relay.
    pub chunk_size: usize,

    /// Tokens wrapped around the serialized recording.
    pub envelope: Envelope,

    /// Logging setup.
    pub logging: LoggingConfig,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            shell: ShellCommand::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            envelope: Envelope::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl RecordConfig {
    /// Create a new builder.
    #[must_use]
    pub fn builder() -> RecordConfigBuilder {
        RecordConfigBuilder::new()
    }

    /// Read the configuration from the environment.
    pub fn from_env(source: &EnvConfig) -> Result<Self> {
        let chunk_size = match source.get(env::vars::CHUNK_SIZE) {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| {
                    RecordError::config(format!(
                        "{}_{} must be a positive integer, got {raw:?}",
                        env::DEFAULT_PREFIX,
                        env::vars::CHUNK_SIZE
                    ))
                })?,
            None => DEFAULT_CHUNK_SIZE,
        };

        Ok(Self {
            shell: ShellCommand::from_env(source),
            chunk_size,
            logging: LoggingConfig::from_env(source)?,
            ..Self::default()
        })
    }
}

/// Builder for [`RecordConfig`].
#[derive(Debug, Clone, Default)]
pub struct RecordConfigBuilder {
    config: RecordConfig,
}

impl RecordConfigBuilder {
    /// Create a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    #[must_use]
    pub const fn from_config(config: RecordConfig) -> Self {
        Self { config }
    }

    /// Set the output path.
    #[must_use]
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output = path.into();
        self
    }

    /// Set the shell.
    #[must_use]
    pub fn shell(mut self, shell: ShellCommand) -> Self {
        self.config.shell = shell;
        self
    }

    /// Set the read chunk size.
    #[must_use]
    pub const fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the envelope tokens.
    #[must_use]
    pub fn envelope(mut self, envelope: Envelope) -> Self {
        self.config.envelope = envelope;
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> RecordConfig {
        self.config
    }
}

/// Configuration for diagnostic logging.
///
/// Logging never goes to standard output, which carries the session.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter directive.
    pub filter: String,

    /// Log file; standard error when unset.
    pub log_file: Option<PathBuf>,

    /// Log format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            log_file: None,
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Create a new logging configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `TERMREC_LOG`, `TERMREC_LOG_FILE` and `TERMREC_LOG_FORMAT`.
    pub fn from_env(source: &EnvConfig) -> Result<Self> {
        let format = match source.get(env::vars::LOG_FORMAT) {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            filter: source.get_or(env::vars::LOG, DEFAULT_LOG_FILTER),
            log_file: source.get(env::vars::LOG_FILE).map(PathBuf::from),
            format,
        })
    }

    /// Set the filter directive.
    #[must_use]
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Set the log file path.
    #[must_use]
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Set the log format.
    #[must_use]
    pub const fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// Log format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,

    /// Newline-delimited JSON.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(RecordError::config(format!("unknown log format {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RecordConfig::default();
        assert_eq!(config.output, PathBuf::from("terminal.record"));
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.envelope, Envelope::default());
        assert_eq!(config.logging.filter, "warn");
        assert!(config.logging.log_file.is_none());
    }

    #[test]
    fn builder_overrides() {
        let config = RecordConfig::builder()
            .output("/tmp/demo.record")
            .chunk_size(512)
            .logging(LoggingConfig::new().filter("debug").format(LogFormat::Json))
            .build();

        assert_eq!(config.output, PathBuf::from("/tmp/demo.record"));
        assert_eq!(config.chunk_size, 512);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn from_env_reads_prefixed_values() {
        let env = EnvConfig::isolated("TERMREC")
            .with_var("TERMREC_CHUNK_SIZE", "2048")
            .with_var("TERMREC_LOG", "termrec=debug")
            .with_var("TERMREC_LOG_FILE", "/tmp/termrec.log")
            .with_var("TERMREC_LOG_FORMAT", "JSON")
            .with_var("SHELL", "/bin/bash");

        let config = RecordConfig::from_env(&env).unwrap();
        assert_eq!(config.chunk_size, 2048);
        assert_eq!(config.logging.filter, "termrec=debug");
        assert_eq!(config.logging.log_file, Some(PathBuf::from("/tmp/termrec.log")));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.shell.program, "/bin/bash");
    }

    #[test]
    fn invalid_chunk_size_rejected() {
        for bad in ["0", "lots", "-5"] {
            let env = EnvConfig::isolated("TERMREC").with_var("TERMREC_CHUNK_SIZE", bad);
            let err = RecordConfig::from_env(&env).unwrap_err();
            assert!(matches!(err, RecordError::Config { .. }), "{bad}");
        }
    }

    #[test]
    fn unknown_log_format_rejected() {
        assert!("yaml".parse::<LogFormat>().is_err());
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
    }
}
