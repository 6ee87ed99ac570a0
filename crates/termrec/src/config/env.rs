//! Environment-based configuration.

use std::collections::HashMap;

use crate::transcript::TerminalSize;

/// Environment configuration prefix.
pub const DEFAULT_PREFIX: &str = "TERMREC";

/// Environment variable reader.
///
/// Values set with [`EnvConfig::with_var`] take precedence over the process
/// environment, so configuration can be exercised without mutating it.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Prefix for environment variables.
    prefix: String,
    /// Explicit values keyed by full variable name.
    overrides: HashMap<String, String>,
    /// Whether the process environment is consulted.
    inherit: bool,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl EnvConfig {
    /// Create a new environment config reader.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            overrides: HashMap::new(),
            inherit: true,
        }
    }

    /// Create a reader that only sees explicitly set values.
    #[must_use]
    pub fn isolated(prefix: impl Into<String>) -> Self {
        Self {
            inherit: false,
            ..Self::new(prefix)
        }
    }

    /// Set a value by its full variable name.
    #[must_use]
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(name.into(), value.into());
        self
    }

    /// Build the full environment variable name.
    fn var_name(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_uppercase()
        } else {
            format!("{}_{}", self.prefix, name.to_uppercase())
        }
    }

    /// Look up a variable by its full name.
    #[must_use]
    pub fn raw(&self, var_name: &str) -> Option<String> {
        if let Some(value) = self.overrides.get(var_name) {
            return Some(value.clone());
        }
        if self.inherit {
            std::env::var(var_name).ok()
        } else {
            None
        }
    }

    /// Get a prefixed string value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        self.raw(&self.var_name(name))
    }

    /// Get a prefixed string value with default.
    #[must_use]
    pub fn get_or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    /// The user's shell, `SHELL` (unprefixed).
    #[must_use]
    pub fn shell(&self) -> Option<String> {
        self.raw(vars::SHELL).filter(|s| !s.is_empty())
    }

    /// Terminal size from `COLUMNS` and `LINES` (unprefixed).
    ///
    /// Both must be positive integers.
    #[must_use]
    pub fn terminal_size(&self) -> Option<TerminalSize> {
        let dimension = |name| {
            self.raw(name)
                .and_then(|v| v.trim().parse::<u16>().ok())
                .filter(|&n| n > 0)
        };
        Some(TerminalSize::new(dimension(vars::COLUMNS)?, dimension(vars::LINES)?))
    }
}

/// Environment variable names.
pub mod vars {
    /// Log filter directive (prefixed).
    pub const LOG: &str = "LOG";
    /// Log file path (prefixed).
    pub const LOG_FILE: &str = "LOG_FILE";
    /// Log format, `text` or `json` (prefixed).
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
    /// Read chunk size in bytes (prefixed).
    pub const CHUNK_SIZE: &str = "CHUNK_SIZE";
    /// Shell to record.
    pub const SHELL: &str = "SHELL";
    /// Terminal columns.
    pub const COLUMNS: &str = "COLUMNS";
    /// Terminal lines.
    pub const LINES: &str = "LINES";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_config_prefix() {
        let config = EnvConfig::new("TEST");
        assert_eq!(config.var_name("foo"), "TEST_FOO");
        assert_eq!(config.var_name("log_file"), "TEST_LOG_FILE");
    }

    #[test]
    fn overrides_are_read() {
        let config = EnvConfig::isolated("TERMREC")
            .with_var("TERMREC_CHUNK_SIZE", " 4096 ")
            .with_var("TERMREC_LOG", "debug");

        assert_eq!(config.get(vars::CHUNK_SIZE).as_deref(), Some(" 4096 "));
        assert_eq!(config.get_or(vars::LOG, "warn"), "debug");
        assert_eq!(config.get(vars::LOG_FILE), None);
    }

    #[test]
    fn isolated_ignores_process_env() {
        let config = EnvConfig::isolated("TERMREC");
        assert_eq!(config.raw("PATH"), None);
        assert_eq!(config.shell(), None);
    }

    #[test]
    fn terminal_size_needs_both_dimensions() {
        let both = EnvConfig::isolated("TERMREC")
            .with_var("COLUMNS", "132")
            .with_var("LINES", "43");
        assert_eq!(both.terminal_size(), Some(TerminalSize::new(132, 43)));

        let partial = EnvConfig::isolated("TERMREC").with_var("COLUMNS", "132");
        assert_eq!(partial.terminal_size(), None);

        let zero = EnvConfig::isolated("TERMREC")
            .with_var("COLUMNS", "0")
            .with_var("LINES", "24");
        assert_eq!(zero.terminal_size(), None);
    }

    #[test]
    fn empty_shell_is_unset() {
        let config = EnvConfig::isolated("TERMREC").with_var("SHELL", "");
        assert_eq!(config.shell(), None);
    }
}
