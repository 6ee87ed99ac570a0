//! Shell detection and the command line used to start it.

use std::path::Path;

use crate::config::EnvConfig;

/// Shell used when `SHELL` is unset.
pub const FALLBACK_SHELL: &str = "/bin/sh";

/// Shells that need special handling at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellType {
    /// zsh.
    Zsh,
    /// Any other shell.
    Other,
}

impl ShellType {
    /// Extra startup arguments for shells whose default startup would
    /// otherwise show up in the recording.
    ///
    /// zsh marks a partial last line with an inverse `%` and a full line of
    /// padding before its first prompt.
    #[must_use]
    pub const fn startup_args(self) -> &'static [&'static str] {
        match self {
            Self::Zsh => &["+o", "PROMPT_SP"],
            Self::Other => &[],
        }
    }
}

/// Detect the shell type from its path or `argv[0]`.
#[must_use]
pub fn detect_from_path(path: &str) -> ShellType {
    let name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path);

    if name.trim_start_matches('-').eq_ignore_ascii_case("zsh") {
        ShellType::Zsh
    } else {
        ShellType::Other
    }
}

/// How the recorded shell is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    /// Program to exec.
    pub program: String,
    /// Arguments after `argv[0]`.
    pub args: Vec<String>,
    /// Start as a login shell (`argv[0]` with a leading dash).
    pub login: bool,
}

impl Default for ShellCommand {
    fn default() -> Self {
        Self::interactive(FALLBACK_SHELL)
    }
}

impl ShellCommand {
    /// An interactive login shell: `-i`, plus any compensating startup flags.
    #[must_use]
    pub fn interactive(program: impl Into<String>) -> Self {
        let program = program.into();
        let mut args = vec!["-i".to_string()];
        args.extend(
            detect_from_path(&program)
                .startup_args()
                .iter()
                .map(|arg| (*arg).to_string()),
        );

        Self {
            program,
            args,
            login: true,
        }
    }

    /// An arbitrary command, not started as a login shell.
    #[must_use]
    pub fn command<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            login: false,
        }
    }

    /// The user's shell from `SHELL`, falling back to `/bin/sh`.
    #[must_use]
    pub fn from_env(env: &EnvConfig) -> Self {
        Self::interactive(env.shell().unwrap_or_else(|| FALLBACK_SHELL.to_string()))
    }

    /// The detected shell type.
    #[must_use]
    pub fn shell_type(&self) -> ShellType {
        detect_from_path(&self.program)
    }
}
