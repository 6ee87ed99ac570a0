//! Session transcripts and recording.
//!
//! This module turns the shell's output into a timed event stream and
//! serializes it in the recording file format.

pub mod format;
pub mod recorder;

pub use format::{DEFAULT_PREFIX, DEFAULT_SUFFIX, Envelope, OutputEvent, Recording, TerminalSize};
pub use recorder::{Recorder, SessionClock};
