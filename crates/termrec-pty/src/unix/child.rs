//! Shell process management for the PTY.
//!
//! The shell is a genuinely separate process: it becomes a session leader,
//! takes the PTY slave as its controlling terminal and has its standard
//! streams attached to the slave before it is exec'd.

use std::ffi::{OsStr, OsString};
use std::io;
use std::os::unix::io::{AsRawFd, OwnedFd};
use std::path::Path;
use std::process::Stdio;

use rustix::io::fcntl_dupfd_cloexec;
use rustix::process::{Pid, Signal, kill_process};
use tokio::process::{Child as TokioChild, Command};

use crate::config::{PtyConfig, PtySignal};
use crate::error::{PtyError, Result, errno_to_io};
use crate::status::ExitStatus;

/// Handle to a process spawned on a PTY slave.
pub struct UnixPtyChild {
    /// The underlying tokio child process.
    child: TokioChild,
    /// The process ID, kept after the child has been reaped.
    pid: u32,
    /// Cached exit status.
    exit_status: Option<ExitStatus>,
}

impl std::fmt::Debug for UnixPtyChild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnixPtyChild")
            .field("pid", &self.pid)
            .field("exit_status", &self.exit_status)
            .finish()
    }
}

impl UnixPtyChild {
    /// Wrap a freshly spawned tokio child.
    pub fn new(child: TokioChild) -> Result<Self> {
        let pid = child.id().ok_or_else(|| {
            PtyError::Spawn(io::Error::new(
                io::ErrorKind::InvalidInput,
                "child exited before its pid was read",
            ))
        })?;

        Ok(Self {
            child,
            pid,
            exit_status: None,
        })
    }

    /// Get the process ID.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Check if the process has not been reaped yet.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.exit_status.is_none()
    }

    /// Wait for the child process to exit.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        if let Some(status) = self.exit_status {
            return Ok(status);
        }

        let status = ExitStatus::from(self.child.wait().await.map_err(PtyError::Wait)?);
        self.exit_status = Some(status);
        Ok(status)
    }

    /// Try to get the exit status without blocking.
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        if let Some(status) = self.exit_status {
            return Ok(Some(status));
        }

        let status = self
            .child
            .try_wait()
            .map_err(PtyError::Wait)?
            .map(ExitStatus::from);
        self.exit_status = status;
        Ok(status)
    }

    /// Send a signal to the child process.
    pub fn signal(&self, signal: PtySignal) -> Result<()> {
        if let Some(status) = self.exit_status {
            return Err(PtyError::ProcessExited(status.code().unwrap_or(-1)));
        }

        let pid = Pid::from_raw(self.pid as i32).ok_or_else(|| {
            PtyError::Signal(io::Error::new(io::ErrorKind::InvalidInput, "invalid pid"))
        })?;

        let signal = Signal::from_named_raw(signal.as_unix_signal()).ok_or_else(|| {
            PtyError::Signal(io::Error::new(io::ErrorKind::InvalidInput, "invalid signal"))
        })?;

        kill_process(pid, signal).map_err(|e| PtyError::Signal(errno_to_io(e)))
    }

    /// Kill the child process (SIGKILL).
    pub fn kill(&mut self) -> Result<()> {
        self.signal(PtySignal::Kill)
    }
}

/// `argv[0]` for a login shell: the program's file name behind a dash.
#[must_use]
pub fn login_arg0(program: &OsStr) -> OsString {
    let name = Path::new(program).file_name().unwrap_or(program);
    let mut arg0 = OsString::from("-");
    arg0.push(name);
    arg0
}

/// Spawn a child process on a PTY slave.
///
/// The child's standard streams are duplicates of the slave. The slave
/// handle itself, and every duplicate made here, is closed in the parent
/// before this function returns, so once the child and its descendants exit
/// the master observes end-of-session.
pub fn spawn_child<S, I>(
    slave_fd: OwnedFd,
    program: S,
    args: I,
    config: &PtyConfig,
) -> Result<UnixPtyChild>
where
    S: AsRef<OsStr>,
    I: IntoIterator,
    I::Item: AsRef<OsStr>,
{
    let dup_slave =
        || fcntl_dupfd_cloexec(&slave_fd, 0).map_err(|e| PtyError::Spawn(errno_to_io(e)));

    let mut cmd = Command::new(program.as_ref());
    cmd.args(args);
    if config.login_shell {
        cmd.arg0(login_arg0(program.as_ref()));
    }

    cmd.stdin(Stdio::from(dup_slave()?));
    cmd.stdout(Stdio::from(dup_slave()?));
    cmd.stderr(Stdio::from(dup_slave()?));

    let slave_raw = slave_fd.as_raw_fd();
    let new_session = config.new_session;
    let controlling_terminal = config.controlling_terminal;

    if new_session || controlling_terminal {
        // SAFETY: setsid and ioctl are async-signal-safe, and slave_raw stays
        // open in the child until exec.
        unsafe {
            cmd.pre_exec(move || {
                // Detach from the recorder's session
                if new_session && libc::setsid() == -1 {
                    return Err(io::Error::last_os_error());
                }

                // Session leadership alone does not grant a controlling terminal everywhere
                if controlling_terminal && libc::ioctl(slave_raw, libc::TIOCSCTTY, 0) == -1 {
                    return Err(io::Error::last_os_error());
                }

                Ok(())
            });
        }
    }

    let child = cmd.spawn().map_err(PtyError::Spawn)?;
    drop(cmd);
    drop(slave_fd);

    let child = UnixPtyChild::new(child)?;
    tracing::debug!(pid = child.pid(), program = ?program.as_ref(), "spawned child on PTY slave");
    Ok(child)
}
