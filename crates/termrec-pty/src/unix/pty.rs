//! The PTY master held by the recorder.
//!
//! The master is allocated with rustix and read through tokio's `AsyncFd`.
//! Writes from the input relay go through a duplicate taken with
//! [`UnixPtyMaster::try_clone_fd`].

use std::io;
use std::os::unix::io::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::pin::Pin;
use std::task::{Context, Poll};

use rustix::fs::{OFlags, fcntl_setfl};
use rustix::io::{Errno, FdFlags, fcntl_dupfd_cloexec, fcntl_setfd};
use rustix::pty::{OpenptFlags, grantpt, openpt, ptsname, unlockpt};
use rustix::termios::{Winsize, tcgetwinsize, tcsetwinsize};
use tokio::io::unix::AsyncFd;
use tokio::io::{AsyncRead, ReadBuf};

use crate::config::WindowSize;
use crate::error::{PtyError, Result, errno_to_io};

/// Master side of a pseudo-terminal.
///
/// Non-blocking and close-on-exec: the spawned shell never holds a copy, so
/// the slave hanging up is visible here.
pub struct UnixPtyMaster {
    fd: AsyncFd<OwnedFd>,
}

impl std::fmt::Debug for UnixPtyMaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnixPtyMaster")
            .field("fd", &self.fd.as_raw_fd())
            .finish()
    }
}

fn create_failed(errno: Errno) -> PtyError {
    PtyError::Create(errno_to_io(errno))
}

pub(crate) const fn to_winsize(size: WindowSize) -> Winsize {
    Winsize {
        ws_row: size.rows,
        ws_col: size.cols,
        ws_xpixel: size.xpixel,
        ws_ypixel: size.ypixel,
    }
}

pub(crate) const fn from_winsize(ws: &Winsize) -> WindowSize {
    WindowSize {
        cols: ws.ws_col,
        rows: ws.ws_row,
        xpixel: ws.ws_xpixel,
        ypixel: ws.ws_ypixel,
    }
}

impl UnixPtyMaster {
    /// Allocate a PTY pair.
    ///
    /// Returns the master and the path of the slave device, which is opened
    /// separately with [`open_slave`]. Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`PtyError::Create`] if allocation fails.
    pub fn open() -> Result<(Self, String)> {
        let master = openpt(OpenptFlags::RDWR | OpenptFlags::NOCTTY).map_err(create_failed)?;
        grantpt(&master).map_err(create_failed)?;
        unlockpt(&master).map_err(create_failed)?;

        let slave_path = ptsname(&master, Vec::new())
            .map_err(create_failed)?
            .into_string()
            .map_err(|_| {
                PtyError::Create(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "slave device path is not UTF-8",
                ))
            })?;

        fcntl_setfd(&master, FdFlags::CLOEXEC).map_err(create_failed)?;
        fcntl_setfl(&master, OFlags::NONBLOCK).map_err(create_failed)?;

        let fd = AsyncFd::new(master).map_err(PtyError::Create)?;
        tracing::debug!(fd = fd.as_raw_fd(), slave = %slave_path, "allocated PTY pair");

        Ok((Self { fd }, slave_path))
    }

    /// Set the window size seen by the slave side.
    pub fn set_window_size(&self, size: WindowSize) -> Result<()> {
        tcsetwinsize(self.fd.get_ref(), to_winsize(size))
            .map_err(|e| PtyError::Resize(errno_to_io(e)))
    }

    /// The window size currently set on the PTY.
    pub fn get_window_size(&self) -> Result<WindowSize> {
        let ws = tcgetwinsize(self.fd.get_ref())
            .map_err(|e| PtyError::GetAttributes(errno_to_io(e)))?;
        Ok(from_winsize(&ws))
    }

    /// Read whatever is already buffered without waiting.
    ///
    /// Returns `ErrorKind::WouldBlock` when nothing is buffered.
    pub fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        rustix::io::read(self.fd.get_ref(), buf).map_err(errno_to_io)
    }

    /// Duplicate the master descriptor for a writer running on another thread.
    ///
    /// The duplicate shares the non-blocking file status of the master.
    pub fn try_clone_fd(&self) -> Result<OwnedFd> {
        fcntl_dupfd_cloexec(self.fd.get_ref(), 0).map_err(PtyError::from)
    }
}

impl AsRawFd for UnixPtyMaster {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl AsFd for UnixPtyMaster {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.get_ref().as_fd()
    }
}

impl AsyncRead for UnixPtyMaster {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        loop {
            let mut ready = match self.fd.poll_read_ready(cx) {
                Poll::Ready(result) => result?,
                Poll::Pending => return Poll::Pending,
            };

            match rustix::io::read(self.fd.get_ref(), buf.initialize_unfilled()) {
                Ok(n) => {
                    buf.advance(n);
                    return Poll::Ready(Ok(()));
                }
                Err(Errno::AGAIN) => ready.clear_ready(),
                Err(Errno::INTR) => {}
                Err(e) => return Poll::Ready(Err(errno_to_io(e))),
            }
        }
    }
}

/// Open the slave side of a PTY.
///
/// The descriptor is close-on-exec; the shell receives its own duplicates as
/// standard input, output and error.
pub fn open_slave(path: &str) -> Result<OwnedFd> {
    rustix::fs::open(
        path,
        OFlags::RDWR | OFlags::NOCTTY | OFlags::CLOEXEC,
        rustix::fs::Mode::empty(),
    )
    .map_err(create_failed)
}
