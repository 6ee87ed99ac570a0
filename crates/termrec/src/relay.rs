//! The two byte-copy loops of a recording session.
//!
//! - [`InputRelay`]: user input to the PTY master, on its own thread
//! - [`OutputRelay`]: PTY output to the screen and the [`Recorder`](crate::transcript::Recorder)
//!
//! They share nothing but the master, which the input side writes through a
//! duplicated descriptor.

pub mod input;
pub mod output;

pub use input::{CancelHandle, CancelToken, InputEnd, InputRelay, InputReport, cancel_pair};
pub use output::{OutputEnd, OutputRelay, RelayEvents, is_session_end};
