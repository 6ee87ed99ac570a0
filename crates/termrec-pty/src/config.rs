//! Configuration types for PTY creation and shell spawning.
//!
//! This module provides [`PtyConfig`] for configuring how the shell is
//! attached to the PTY slave, [`WindowSize`] for the slave's initial size and
//! [`PtySignal`] for the signals the recorder sends to the shell.

/// Configuration for spawning a process in a new PTY.
///
/// # Example
///
/// ```
/// use termrec_pty::PtyConfig;
///
/// let config = PtyConfig::builder()
///     .window_size(120, 40)
///     .login_shell(true)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// Initial window size (columns, rows).
    pub window_size: (u16, u16),

    /// Whether the child becomes a session leader (`setsid`).
    pub new_session: bool,

    /// Whether the child acquires the slave as its controlling terminal.
    pub controlling_terminal: bool,

    /// Whether `argv[0]` carries the leading dash of a login shell.
    pub login_shell: bool,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            window_size: (80, 24),
            new_session: true,
            controlling_terminal: true,
            login_shell: false,
        }
    }
}

impl PtyConfig {
    /// Create a new builder for `PtyConfig`.
    #[must_use]
    pub fn builder() -> PtyConfigBuilder {
        PtyConfigBuilder::new()
    }

    /// Create a new `PtyConfig` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Builder for [`PtyConfig`].
#[derive(Debug, Clone, Default)]
pub struct PtyConfigBuilder {
    config: PtyConfig,
}

impl PtyConfigBuilder {
    /// Create a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial window size.
    #[must_use]
    pub const fn window_size(mut self, cols: u16, rows: u16) -> Self {
        self.config.window_size = (cols, rows);
        self
    }

    /// Set whether to create a new session.
    #[must_use]
    pub const fn new_session(mut self, value: bool) -> Self {
        self.config.new_session = value;
        self
    }

    /// Set whether to acquire a controlling terminal.
    #[must_use]
    pub const fn controlling_terminal(mut self, value: bool) -> Self {
        self.config.controlling_terminal = value;
        self
    }

    /// Start the program as a login shell.
    #[must_use]
    pub const fn login_shell(mut self, value: bool) -> Self {
        self.config.login_shell = value;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> PtyConfig {
        self.config
    }
}

/// Signals the recorder may deliver to the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PtySignal {
    /// SIGINT.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// SIGKILL (cannot be caught).
    Kill,
    /// SIGHUP, the terminal went away.
    Hangup,
}

impl PtySignal {
    /// Get the Unix signal number.
    #[must_use]
    pub const fn as_unix_signal(self) -> i32 {
        match self {
            Self::Interrupt => libc::SIGINT,
            Self::Terminate => libc::SIGTERM,
            Self::Kill => libc::SIGKILL,
            Self::Hangup => libc::SIGHUP,
        }
    }
}

/// Window size for the PTY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    /// Number of columns (characters per line).
    pub cols: u16,
    /// Number of rows (lines).
    pub rows: u16,
    /// Pixel width (optional, often 0).
    pub xpixel: u16,
    /// Pixel height (optional, often 0).
    pub ypixel: u16,
}

impl WindowSize {
    /// Create a new window size with the given dimensions.
    #[must_use]
    pub const fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            xpixel: 0,
            ypixel: 0,
        }
    }

    /// Whether either dimension is zero, as reported by detached terminals.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cols == 0 || self.rows == 0
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

impl From<(u16, u16)> for WindowSize {
    fn from((cols, rows): (u16, u16)) -> Self {
        Self::new(cols, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = PtyConfig::builder()
            .window_size(120, 40)
            .login_shell(true)
            .build();

        assert_eq!(config.window_size, (120, 40));
        assert!(config.login_shell);
        assert!(config.new_session);
        assert!(config.controlling_terminal);
    }

    #[test]
    fn window_size_default() {
        let size = WindowSize::default();
        assert_eq!(size.cols, 80);
        assert_eq!(size.rows, 24);
        assert!(!size.is_empty());
        assert!(WindowSize::new(0, 24).is_empty());
    }

    #[test]
    fn hangup_signal_number() {
        assert_eq!(PtySignal::Hangup.as_unix_signal(), libc::SIGHUP);
        assert_eq!(PtySignal::Kill.as_unix_signal(), libc::SIGKILL);
    }
}
