//! Recording sessions.
//!
//! A session ties the pieces together: the shell is started on a fresh PTY,
//! a watcher task owns it and reports its exit, the input relay runs on its
//! own thread, and the output relay runs on the caller's task until the
//! session ends. [`record`] wraps a session with everything the command-line
//! tool needs around it.

use std::io;
use std::os::unix::io::{AsFd, OwnedFd};
use std::path::PathBuf;

use termrec_pty::{
    ExitStatus, NativePtySystem, PtyConfig, PtySignal, RawModeFlags, RawModeGuard,
    TerminationSignal, UnixPtyChild, query_window_size, start_termination_watcher,
};
use tokio::io::AsyncWrite;
use tokio::sync::{mpsc, oneshot};

use crate::config::{EnvConfig, RecordConfig};
use crate::error::{RecordError, Result};
use crate::logging::hold_stderr;
use crate::output::OutputFile;
use crate::relay::{InputRelay, OutputEnd, OutputRelay, RelayEvents};
use crate::shell::ShellCommand;
use crate::transcript::{Recorder, Recording, TerminalSize};

/// What a completed session produced.
#[derive(Debug)]
pub struct SessionOutcome {
    /// The recorded output.
    pub recording: Recording,
    /// How the output relay stopped.
    pub end: OutputEnd,
    /// The shell's exit status, if it was collected.
    pub exit_status: Option<ExitStatus>,
}

/// One recording session.
#[derive(Debug, Clone)]
pub struct RecordSession {
    shell: ShellCommand,
    size: TerminalSize,
    chunk_size: usize,
}

impl RecordSession {
    /// Create a session for `shell` on a terminal of `size`.
    #[must_use]
    pub fn new(shell: ShellCommand, size: TerminalSize) -> Self {
        Self {
            shell,
            size,
            chunk_size: crate::config::DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the read chunk size for both relays.
    #[must_use]
    pub const fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Run the session to completion.
    ///
    /// `input` is what the user types, `sink` is where the shell's output is
    /// mirrored. Returns once the shell has exited and both relays stopped.
    /// On error the shell is sent `SIGHUP`.
    pub async fn run<W>(
        self,
        input: OwnedFd,
        sink: &mut W,
        interrupt: Option<mpsc::UnboundedReceiver<TerminationSignal>>,
    ) -> Result<SessionOutcome>
    where
        W: AsyncWrite + Unpin,
    {
        let pty_config = PtyConfig::builder()
            .window_size(self.size.columns, self.size.rows)
            .login_shell(self.shell.login)
            .build();

        let mut recorder = Recorder::new(self.size);
        let (mut master, child) =
            NativePtySystem::spawn(&self.shell.program, &self.shell.args, &pty_config)?;
        tracing::info!(
            pid = child.pid(),
            shell = %self.shell.program,
            size = %self.size,
            "shell started"
        );

        let (exit_tx, exit_rx) = oneshot::channel();
        let (hangup_tx, hangup_rx) = oneshot::channel();
        tokio::spawn(watch_shell(child, hangup_rx, exit_tx));

        let writer = master.try_clone_fd()?;
        let (input_relay, input_done) = match InputRelay::spawn(input, writer, self.chunk_size) {
            Ok(spawned) => spawned,
            Err(e) => {
                let _ = hangup_tx.send(());
                return Err(RecordError::Input(e));
            }
        };

        let mut events = RelayEvents::new(exit_rx, input_done);
        if let Some(interrupt) = interrupt {
            events = events.with_interrupt(interrupt);
        }

        let result = OutputRelay::new(self.chunk_size)
            .run(&mut master, sink, &mut recorder, &mut events)
            .await;

        input_relay.cancel();
        join_input(input_relay).await;

        let end = match result {
            Ok(end) => end,
            Err(e) => {
                tracing::debug!(error = %e, "hanging up shell after relay error");
                let _ = hangup_tx.send(());
                return Err(e);
            }
        };

        let exit_status = match (end, events.shell_exit.take()) {
            (OutputEnd::ShellExited(status), _) => Some(status),
            (_, Some(rx)) => rx.await.ok(),
            (_, None) => None,
        };
        drop(hangup_tx);

        match exit_status {
            Some(status) => tracing::info!(%status, ?end, "session ended"),
            None => tracing::warn!(?end, "session ended without a shell status"),
        }

        Ok(SessionOutcome {
            recording: recorder.into_recording(),
            end,
            exit_status,
        })
    }
}

/// Own the shell until it exits, hanging it up on request.
async fn watch_shell(
    mut child: UnixPtyChild,
    hangup: oneshot::Receiver<()>,
    exit: oneshot::Sender<ExitStatus>,
) {
    let status = tokio::select! {
        status = child.wait() => status,
        Ok(()) = hangup => {
            if let Err(e) = child.signal(PtySignal::Hangup) {
                tracing::warn!(error = %e, "failed to hang up shell");
            }
            child.wait().await
        }
    };

    match status {
        Ok(status) => {
            tracing::debug!(pid = child.pid(), %status, "shell reaped");
            let _ = exit.send(status);
        }
        Err(e) => tracing::error!(pid = child.pid(), error = %e, "waiting for shell failed"),
    }
}

/// Wait for the input thread without blocking the runtime.
async fn join_input(relay: InputRelay) {
    if tokio::task::spawn_blocking(move || relay.cancel_and_join())
        .await
        .is_err()
    {
        tracing::error!("input relay join task failed");
    }
}

/// Size of the terminal behind `fd`.
///
/// Falls back to `COLUMNS`/`LINES`, then to 80x24, when the terminal does not
/// report a usable size.
pub fn terminal_size<Fd: AsFd>(fd: Fd, env: &EnvConfig) -> TerminalSize {
    match query_window_size(fd) {
        Ok(size) if !size.is_empty() => size.into(),
        Ok(_) | Err(_) => env.terminal_size().unwrap_or_default(),
    }
}

/// Record the user's shell to `config.output`.
///
/// Puts standard input's terminal into raw mode for the duration of the
/// session and always restores it. Log lines bound for standard error are
/// held back until the terminal is restored. Returns the path of the written
/// recording.
pub async fn record(config: &RecordConfig) -> Result<PathBuf> {
    let output = OutputFile::create(&config.output)?;

    let stdin = io::stdin();
    let size = terminal_size(stdin.as_fd(), &EnvConfig::default());

    let (interrupt, _signals) = start_termination_watcher()
        .map_err(|e| RecordError::io_context("installing signal handlers", e))?;

    let held_logs = hold_stderr();
    let guard = RawModeGuard::enter(stdin.as_fd(), &RawModeFlags::standard())?;

    let input = RecordError::with_io_context(
        stdin.as_fd().try_clone_to_owned(),
        "duplicating standard input",
    )?;
    let mut stdout = tokio::io::stdout();

    let result = RecordSession::new(config.shell.clone(), size)
        .chunk_size(config.chunk_size)
        .run(input, &mut stdout, Some(interrupt))
        .await
        .and_then(|outcome| {
            let text = outcome.recording.to_envelope(&config.envelope)?;
            output.persist(&text)
        });

    let restored = guard.restore();
    held_logs.release();
    let path = result?;
    restored?;
    Ok(path)
}
