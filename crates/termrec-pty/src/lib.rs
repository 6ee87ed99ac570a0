//! termrec-pty: Unix terminal plumbing for the termrec session recorder
//!
//! This crate owns every piece of operating-system terminal handling the
//! recorder needs:
//!
//! - **PTY allocation**: a master/slave pair with async reads on the master
//! - **Shell spawning**: the shell runs as a session leader with the slave as
//!   its controlling terminal and standard streams
//! - **Raw mode**: [`RawModeGuard`] switches the user's terminal to raw mode
//!   and puts the captured attributes back when dropped
//! - **Termination signals**: external stop requests delivered on a channel
//!
//! # Quick Start
//!
//! ```ignore
//! use termrec_pty::{NativePtySystem, PtyConfig};
//! use tokio::io::AsyncReadExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PtyConfig::builder().window_size(80, 24).build();
//!     let (mut master, mut child) = NativePtySystem::spawn("/bin/sh", ["-c", "ls"], &config)?;
//!
//!     let mut buf = [0u8; 1024];
//!     let n = master.read(&mut buf).await?;
//!     println!("{}", String::from_utf8_lossy(&buf[..n]));
//!
//!     child.wait().await?;
//!     Ok(())
//! }
//! ```

#[cfg(not(unix))]
compile_error!("termrec-pty only supports Unix platforms");

pub mod config;
pub mod error;
pub mod status;

#[cfg(unix)]
pub mod unix;

pub use config::{PtyConfig, PtyConfigBuilder, PtySignal, WindowSize};
pub use error::{PtyError, Result};
pub use status::ExitStatus;

#[cfg(unix)]
pub use unix::{
    NativePtySystem, RawModeFlags, RawModeGuard, SignalHandle, TerminalState, TerminationSignal,
    UnixPtyChild, UnixPtyMaster, UnixPtySystem, query_window_size, start_termination_watcher,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PtyConfig::default();
        assert_eq!(config.window_size, (80, 24));
        assert!(config.new_session);
        assert!(config.controlling_terminal);
    }

    #[test]
    fn window_size_conversion() {
        let size = WindowSize::from((120, 40));
        assert_eq!(size, WindowSize::new(120, 40));
    }
}
