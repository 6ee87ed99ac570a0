//! Shell output to the screen and the recorder.

use std::io;
use std::time::Instant;

use termrec_pty::{ExitStatus, PtyError, TerminationSignal, UnixPtyMaster};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};

use super::input::{InputEnd, InputReport};
use crate::config::DEFAULT_CHUNK_SIZE;
use crate::error::{RecordError, Result};
use crate::transcript::Recorder;

/// Why the output relay stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEnd {
    /// The master reported end-of-file.
    Eof,
    /// The last slave handle closed (`EIO`).
    Hangup,
    /// The master descriptor is no longer valid (`EBADF`).
    Closed,
    /// The shell exit notice arrived; buffered output was drained.
    ShellExited(ExitStatus),
}

/// Notifications the output relay listens to besides the master.
#[derive(Debug)]
pub struct RelayEvents {
    /// Fires with the shell's status when it exits.
    pub shell_exit: Option<oneshot::Receiver<ExitStatus>>,
    /// Fires when the input relay stops.
    pub input_done: Option<oneshot::Receiver<InputReport>>,
    /// External requests to stop recording.
    pub interrupt: Option<mpsc::UnboundedReceiver<TerminationSignal>>,
}

impl RelayEvents {
    /// Events for a session, without an interrupt source.
    #[must_use]
    pub const fn new(
        shell_exit: oneshot::Receiver<ExitStatus>,
        input_done: oneshot::Receiver<InputReport>,
    ) -> Self {
        Self {
            shell_exit: Some(shell_exit),
            input_done: Some(input_done),
            interrupt: None,
        }
    }

    /// Listen for termination signals too.
    #[must_use]
    pub fn with_interrupt(mut self, interrupt: mpsc::UnboundedReceiver<TerminationSignal>) -> Self {
        self.interrupt = Some(interrupt);
        self
    }
}

/// Whether a master read error means the session is over.
#[must_use]
pub fn is_session_end(err: &io::Error) -> bool {
    matches!(err.raw_os_error(), Some(libc::EIO | libc::EBADF))
}

/// Copies PTY output to a sink and records it.
#[derive(Debug, Clone, Copy)]
pub struct OutputRelay {
    chunk_size: usize,
}

impl Default for OutputRelay {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl OutputRelay {
    /// Create a relay reading at most `chunk_size` bytes at a time.
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Relay until the session ends.
    ///
    /// End-of-file, `EIO`, `EBADF` and the shell exit notice end the session
    /// normally. A failed input relay, a failed sink write or a termination
    /// signal end it with an error.
    pub async fn run<W>(
        &self,
        master: &mut UnixPtyMaster,
        sink: &mut W,
        recorder: &mut Recorder,
        events: &mut RelayEvents,
    ) -> Result<OutputEnd>
    where
        W: AsyncWrite + Unpin,
    {
        let mut buf = vec![0u8; self.chunk_size];
        let RelayEvents {
            shell_exit,
            input_done,
            interrupt,
        } = events;

        loop {
            tokio::select! {
                biased;

                signal = recv_signal(interrupt), if interrupt.is_some() => {
                    match signal {
                        Some(signal) => {
                            tracing::info!(%signal, "termination requested");
                            return Err(RecordError::Interrupted { signal });
                        }
                        None => *interrupt = None,
                    }
                }

                result = master.read(&mut buf) => {
                    match result {
                        Ok(0) => {
                            tracing::debug!("master reached end of file");
                            return Ok(OutputEnd::Eof);
                        }
                        Ok(n) => forward(sink, recorder, &buf[..n]).await?,
                        Err(e) if e.raw_os_error() == Some(libc::EIO) => {
                            tracing::debug!("slave side closed");
                            return Ok(OutputEnd::Hangup);
                        }
                        Err(e) if is_session_end(&e) => {
                            tracing::debug!("master descriptor closed");
                            return Ok(OutputEnd::Closed);
                        }
                        Err(e) => return Err(RecordError::Output(e)),
                    }
                }

                report = recv_once(input_done), if input_done.is_some() => {
                    *input_done = None;
                    match report {
                        Ok(Ok(InputEnd::Eof)) => {
                            tracing::debug!("input closed, waiting for the shell");
                        }
                        Ok(Ok(InputEnd::Cancelled)) => {}
                        Ok(Err(e)) => return Err(RecordError::Input(e)),
                        Err(_) => {
                            return Err(RecordError::Input(io::Error::other(
                                "input relay stopped without reporting",
                            )));
                        }
                    }
                }

                status = recv_once(shell_exit), if shell_exit.is_some() => {
                    *shell_exit = None;
                    let Ok(status) = status else {
                        return Err(PtyError::Wait(io::Error::other(
                            "shell watcher stopped without a status",
                        ))
                        .into());
                    };
                    tracing::debug!(%status, "shell exited, draining output");
                    drain(master, sink, recorder, &mut buf).await?;
                    return Ok(OutputEnd::ShellExited(status));
                }
            }
        }
    }
}

/// Forward whatever is already buffered in the master.
async fn drain<W>(
    master: &mut UnixPtyMaster,
    sink: &mut W,
    recorder: &mut Recorder,
    buf: &mut [u8],
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        match master.try_read(buf) {
            Ok(0) => return Ok(()),
            Ok(n) => forward(sink, recorder, &buf[..n]).await?,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock || is_session_end(&e) => {
                return Ok(());
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(RecordError::Output(e)),
        }
    }
}

/// Mirror one chunk to the sink, then record it.
async fn forward<W>(sink: &mut W, recorder: &mut Recorder, chunk: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    sink.write_all(chunk).await.map_err(RecordError::Output)?;
    sink.flush().await.map_err(RecordError::Output)?;
    recorder.record(Instant::now(), chunk);
    tracing::trace!(bytes = chunk.len(), "output chunk");
    Ok(())
}

async fn recv_once<T>(
    rx: &mut Option<oneshot::Receiver<T>>,
) -> std::result::Result<T, oneshot::error::RecvError> {
    match rx {
        Some(rx) => rx.await,
        None => std::future::pending().await,
    }
}

async fn recv_signal(
    rx: &mut Option<mpsc::UnboundedReceiver<TerminationSignal>>,
) -> Option<TerminationSignal> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::TerminalSize;
    use termrec_pty::unix::open_slave;

    fn recorder() -> Recorder {
        Recorder::new(TerminalSize::new(80, 24))
    }

    /// Wait until slave output has reached the master side.
    fn wait_readable(master: &UnixPtyMaster) {
        use rustix::event::{PollFd, PollFlags, Timespec, poll};

        let timeout = Timespec {
            tv_sec: 5,
            tv_nsec: 0,
        };
        let mut fds = [PollFd::new(master, PollFlags::IN)];
        assert_eq!(poll(&mut fds, Some(&timeout)).unwrap(), 1);
    }

    #[test]
    fn session_end_errors() {
        assert!(is_session_end(&io::Error::from_raw_os_error(libc::EIO)));
        assert!(is_session_end(&io::Error::from_raw_os_error(libc::EBADF)));
        assert!(!is_session_end(&io::Error::from_raw_os_error(libc::EINTR)));
    }

    #[tokio::test]
    async fn relays_until_slave_closes() {
        let (mut master, slave_path) = UnixPtyMaster::open().unwrap();
        let slave = open_slave(&slave_path).unwrap();
        rustix::io::write(&slave, b"hello").unwrap();
        drop(slave);

        let (_exit_tx, exit_rx) = oneshot::channel();
        let (_input_tx, input_rx) = oneshot::channel();
        let mut events = RelayEvents::new(exit_rx, input_rx);
        let mut sink = Vec::new();
        let mut recorder = recorder();

        let end = OutputRelay::default()
            .run(&mut master, &mut sink, &mut recorder, &mut events)
            .await
            .unwrap();

        assert_eq!(end, OutputEnd::Hangup);
        assert_eq!(sink, b"hello");
        assert_eq!(recorder.into_recording().output_text(), "hello");
    }

    #[tokio::test]
    async fn exit_notice_drains_and_stops() {
        let (mut master, slave_path) = UnixPtyMaster::open().unwrap();
        // Keep the slave open so only the notice can end the session
        let slave = open_slave(&slave_path).unwrap();
        rustix::io::write(&slave, b"bye").unwrap();
        wait_readable(&master);

        let (exit_tx, exit_rx) = oneshot::channel();
        let (_input_tx, input_rx) = oneshot::channel();
        let mut events = RelayEvents::new(exit_rx, input_rx);
        exit_tx.send(ExitStatus::Exited(0)).unwrap();

        let mut sink = Vec::new();
        let mut recorder = recorder();
        let end = OutputRelay::default()
            .run(&mut master, &mut sink, &mut recorder, &mut events)
            .await
            .unwrap();

        assert_eq!(end, OutputEnd::ShellExited(ExitStatus::Exited(0)));
        assert!(events.shell_exit.is_none());
        assert_eq!(sink, b"bye");
        assert_eq!(recorder.into_recording().output_text(), "bye");
        drop(slave);
    }

    #[tokio::test]
    async fn drain_collects_buffered_output() {
        let (mut master, slave_path) = UnixPtyMaster::open().unwrap();
        let slave = open_slave(&slave_path).unwrap();
        rustix::io::write(&slave, b"last words").unwrap();
        wait_readable(&master);

        let mut sink = Vec::new();
        let mut rec = recorder();
        let mut buf = [0u8; 4];
        drain(&mut master, &mut sink, &mut rec, &mut buf)
            .await
            .unwrap();

        assert_eq!(sink, b"last words");

        // Nothing left and the slave still open: drain returns at once
        drain(&mut master, &mut sink, &mut rec, &mut buf)
            .await
            .unwrap();
        assert_eq!(sink, b"last words");
        assert_eq!(rec.into_recording().output_text(), "last words");
        drop(slave);
    }

    #[tokio::test]
    async fn drain_stops_at_hangup() {
        let (mut master, slave_path) = UnixPtyMaster::open().unwrap();
        let slave = open_slave(&slave_path).unwrap();
        rustix::io::write(&slave, b"gone").unwrap();
        wait_readable(&master);
        drop(slave);

        let mut sink = Vec::new();
        drain(&mut master, &mut sink, &mut recorder(), &mut [0u8; 64])
            .await
            .unwrap();
        assert_eq!(sink, b"gone");
    }

    #[tokio::test]
    async fn input_failure_aborts() {
        let (mut master, slave_path) = UnixPtyMaster::open().unwrap();
        let _slave = open_slave(&slave_path).unwrap();

        let (_exit_tx, exit_rx) = oneshot::channel();
        let (input_tx, input_rx) = oneshot::channel();
        input_tx
            .send(Err(io::Error::from_raw_os_error(libc::EIO)))
            .unwrap();
        let mut events = RelayEvents::new(exit_rx, input_rx);

        let err = OutputRelay::default()
            .run(&mut master, &mut Vec::new(), &mut recorder(), &mut events)
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::Input(_)));
    }

    #[tokio::test]
    async fn input_eof_keeps_relaying() {
        let (mut master, slave_path) = UnixPtyMaster::open().unwrap();
        let slave = open_slave(&slave_path).unwrap();

        let (exit_tx, exit_rx) = oneshot::channel();
        let (input_tx, input_rx) = oneshot::channel();
        input_tx.send(Ok(InputEnd::Eof)).unwrap();
        let mut events = RelayEvents::new(exit_rx, input_rx);

        let relay = tokio::spawn(async move {
            let mut sink = Vec::new();
            let end = OutputRelay::default()
                .run(&mut master, &mut sink, &mut recorder(), &mut events)
                .await;
            (end, sink)
        });

        rustix::io::write(&slave, b"still here").unwrap();
        drop(slave);

        let (end, sink) = relay.await.unwrap();
        assert_eq!(end.unwrap(), OutputEnd::Hangup);
        assert_eq!(sink, b"still here");
        drop(exit_tx);
    }

    #[tokio::test]
    async fn interrupt_aborts() {
        let (mut master, slave_path) = UnixPtyMaster::open().unwrap();
        let _slave = open_slave(&slave_path).unwrap();

        let (_exit_tx, exit_rx) = oneshot::channel();
        let (_input_tx, input_rx) = oneshot::channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        signal_tx.send(TerminationSignal::Hangup).unwrap();
        let mut events = RelayEvents::new(exit_rx, input_rx).with_interrupt(signal_rx);

        let err = OutputRelay::default()
            .run(&mut master, &mut Vec::new(), &mut recorder(), &mut events)
            .await
            .unwrap_err();
        assert!(err.is_interrupted());
    }
}
