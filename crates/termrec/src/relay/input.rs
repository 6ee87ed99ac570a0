//! User input to the PTY master.
//!
//! Reading a live terminal never reaches end-of-file on its own, so the
//! input relay runs on a dedicated thread that waits on both the input and a
//! cancellation socket. Cancelling wakes the thread immediately, without
//! touching the shared terminal descriptor.

use std::io::{self, Write};
use std::os::unix::io::{AsFd, OwnedFd};
use std::os::unix::net::UnixStream;
use std::thread::JoinHandle;

use rustix::event::{PollFd, PollFlags, poll};
use rustix::io::Errno;
use tokio::sync::oneshot;

/// How the input relay stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEnd {
    /// The input reached end-of-file.
    Eof,
    /// The relay was cancelled.
    Cancelled,
}

/// Result reported when the input relay stops.
pub type InputReport = io::Result<InputEnd>;

/// Requests cancellation of an input relay. Dropping it cancels too.
#[derive(Debug)]
pub struct CancelHandle {
    tx: UnixStream,
}

/// The waiting side of a [`CancelHandle`].
#[derive(Debug)]
pub struct CancelToken {
    rx: UnixStream,
}

impl CancelHandle {
    /// Wake the relay and make it stop.
    pub fn cancel(&self) {
        // A closed peer means the relay already stopped
        let _ = (&self.tx).write_all(&[1]);
    }
}

/// Create a connected cancellation pair.
pub fn cancel_pair() -> io::Result<(CancelHandle, CancelToken)> {
    let (tx, rx) = UnixStream::pair()?;
    Ok((CancelHandle { tx }, CancelToken { rx }))
}

/// A running input relay thread.
#[derive(Debug)]
pub struct InputRelay {
    cancel: CancelHandle,
    thread: Option<JoinHandle<()>>,
}

impl InputRelay {
    /// Start copying `input` to `master` in chunks of at most `chunk_size`.
    ///
    /// The returned receiver fires once when the relay stops, with the
    /// reason or the fatal I/O error.
    pub fn spawn(
        input: OwnedFd,
        master: OwnedFd,
        chunk_size: usize,
    ) -> io::Result<(Self, oneshot::Receiver<InputReport>)> {
        let (cancel, token) = cancel_pair()?;
        let (done_tx, done_rx) = oneshot::channel();

        let thread = std::thread::Builder::new()
            .name("termrec-input".into())
            .spawn(move || {
                let result = relay_input(&input, &master, &token, chunk_size);
                match &result {
                    Ok(end) => tracing::debug!(?end, "input relay stopped"),
                    Err(e) => tracing::debug!(error = %e, "input relay failed"),
                }
                let _ = done_tx.send(result);
            })?;

        Ok((
            Self {
                cancel,
                thread: Some(thread),
            },
            done_rx,
        ))
    }

    /// Request cancellation without waiting.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancel the relay and wait for its thread to exit.
    pub fn cancel_and_join(mut self) {
        self.cancel.cancel();
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            tracing::error!("input relay thread panicked");
        }
    }
}

impl Drop for InputRelay {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Copy input to the master until end-of-file or cancellation.
pub fn relay_input<I: AsFd, M: AsFd>(
    input: I,
    master: M,
    token: &CancelToken,
    chunk_size: usize,
) -> io::Result<InputEnd> {
    let mut buf = vec![0u8; chunk_size.max(1)];

    loop {
        let (input_ready, cancelled) = wait_for(&input, PollFlags::IN, token)?;
        if cancelled {
            return Ok(InputEnd::Cancelled);
        }
        if !input_ready {
            continue;
        }

        let n = match rustix::io::read(&input, &mut buf[..]) {
            Ok(n) => n,
            Err(Errno::INTR | Errno::AGAIN) => continue,
            Err(e) => return Err(e.into()),
        };
        if n == 0 {
            return Ok(InputEnd::Eof);
        }

        tracing::trace!(bytes = n, "input chunk");
        if !write_all(&master, &buf[..n], token)? {
            return Ok(InputEnd::Cancelled);
        }
    }
}

/// Write a whole chunk to a possibly non-blocking descriptor.
///
/// Returns `false` if cancelled before the chunk was fully written.
fn write_all<M: AsFd>(master: M, mut data: &[u8], token: &CancelToken) -> io::Result<bool> {
    while !data.is_empty() {
        match rustix::io::write(&master, data) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => data = &data[n..],
            Err(Errno::INTR) => {}
            Err(Errno::AGAIN) => {
                let (_, cancelled) = wait_for(&master, PollFlags::OUT, token)?;
                if cancelled {
                    return Ok(false);
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

/// Block until `fd` is ready for `interest` or the token fires.
///
/// Returns `(ready, cancelled)`.
fn wait_for<F: AsFd>(fd: F, interest: PollFlags, token: &CancelToken) -> io::Result<(bool, bool)> {
    let mut fds = [
        PollFd::new(&fd, interest),
        PollFd::new(&token.rx, PollFlags::IN),
    ];

    match poll(&mut fds, None) {
        Ok(_) => {}
        Err(Errno::INTR) => return Ok((false, false)),
        Err(e) => return Err(e.into()),
    }

    let ready = !fds[0].revents().is_empty();
    let cancelled = !fds[1].revents().is_empty();
    Ok((ready, cancelled))
}
