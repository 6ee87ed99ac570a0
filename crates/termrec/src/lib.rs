//! termrec: record an interactive shell session for later replay
//!
//! The user's shell runs on a fresh pseudo-terminal while its output is
//! mirrored to the real terminal and timestamped. When the shell exits, the
//! output stream is written as a JSON document wrapped in a script call:
//!
//! ```text
//! session_recorded({"size":[80,24],"stream":[{"t":"op","d":0,"val":"$ "}]});
//! ```
//!
//! # Layout
//!
//! - [`transcript`]: the recording engine (clock, coalescing, serialization)
//! - [`relay`]: the input and output copy loops
//! - [`session`]: runs a shell on a PTY and records it
//! - [`config`], [`cli`], [`logging`]: everything the binary needs around it
//!
//! # Example
//!
//! ```ignore
//! use termrec::{RecordConfig, record};
//!
//! #[tokio::main]
//! async fn main() -> termrec::Result<()> {
//!     let config = RecordConfig::builder().output("demo.record").build();
//!     let path = record(&config).await?;
//!     eprintln!("Session recorded to {}", path.display());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod encoding;
pub mod error;
pub mod logging;
pub mod output;
pub mod relay;
pub mod session;
pub mod shell;
pub mod transcript;

pub use cli::{Cli, Command};
pub use config::{EnvConfig, LogFormat, LoggingConfig, RecordConfig, RecordConfigBuilder};
pub use encoding::{Utf8Normalizer, decode_best_effort};
pub use error::{RecordError, Result};
pub use logging::{StderrHold, hold_stderr, init_logging};
pub use output::OutputFile;
pub use relay::{InputEnd, InputRelay, OutputEnd, OutputRelay, RelayEvents};
pub use session::{RecordSession, SessionOutcome, record, terminal_size};
pub use shell::{ShellCommand, ShellType};
pub use transcript::{Envelope, OutputEvent, Recorder, Recording, SessionClock, TerminalSize};
