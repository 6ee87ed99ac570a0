//! Session recording.

use std::time::Instant;

use super::format::{Envelope, OutputEvent, Recording, TerminalSize};
use crate::encoding::Utf8Normalizer;
use crate::error::Result;

/// Millisecond clock measuring the gap between recorded chunks.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    /// Session start.
    origin: Instant,
    /// Milliseconds since `origin` at the last tick.
    last_ms: u64,
}

impl SessionClock {
    /// Start a clock at `origin`.
    #[must_use]
    pub const fn new(origin: Instant) -> Self {
        Self { origin, last_ms: 0 }
    }

    /// Start a clock now.
    #[must_use]
    pub fn start() -> Self {
        Self::new(Instant::now())
    }

    /// Whole milliseconds from the origin to `now`.
    #[must_use]
    pub fn millis_at(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.origin).as_millis() as u64
    }

    /// Milliseconds since the last tick, moving the clock to `now`.
    ///
    /// Never negative: an instant earlier than the last tick counts as zero.
    pub fn tick(&mut self, now: Instant) -> u64 {
        let now_ms = self.millis_at(now);
        let delay = now_ms.saturating_sub(self.last_ms);
        self.last_ms = self.last_ms.max(now_ms);
        delay
    }
}

/// Builds a [`Recording`] from output chunks.
///
/// Chunks that arrive with no measurable delay after an existing event are
/// folded into that event, so a burst of reads for one logical write stays a
/// single timed unit.
#[derive(Debug)]
pub struct Recorder {
    clock: SessionClock,
    decoder: Utf8Normalizer,
    recording: Recording,
}

impl Recorder {
    /// Create a recorder whose clock starts now.
    #[must_use]
    pub fn new(size: TerminalSize) -> Self {
        Self::with_clock(size, SessionClock::start())
    }

    /// Create a recorder with an explicit clock.
    #[must_use]
    pub fn with_clock(size: TerminalSize, clock: SessionClock) -> Self {
        Self {
            clock,
            decoder: Utf8Normalizer::new(),
            recording: Recording::new(size),
        }
    }

    /// Record a chunk read at `now`.
    ///
    /// A chunk that only holds the start of a multi-byte character produces
    /// no event and leaves the clock alone; the character is recorded with
    /// the chunk that completes it.
    pub fn record(&mut self, now: Instant, chunk: &[u8]) {
        let text = self.decoder.push(chunk);
        if text.is_empty() {
            return;
        }
        let delay = self.clock.tick(now);
        self.append(delay, text);
    }

    /// Record a chunk with an already computed delay.
    pub fn add_output(&mut self, delay_ms: u64, chunk: &[u8]) {
        let text = self.decoder.push(chunk);
        if text.is_empty() {
            return;
        }
        self.append(delay_ms, text);
    }

    fn append(&mut self, delay_ms: u64, text: String) {
        match self.recording.events.last_mut() {
            Some(last) if delay_ms == 0 => last.data.push_str(&text),
            _ => self.recording.events.push(OutputEvent::new(delay_ms, text)),
        }
    }

    /// Events recorded so far.
    #[must_use]
    pub fn events(&self) -> &[OutputEvent] {
        &self.recording.events
    }

    /// Number of events recorded so far.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.recording.events.len()
    }

    /// The terminal size this recording was started with.
    #[must_use]
    pub const fn size(&self) -> TerminalSize {
        self.recording.size
    }

    /// Close the recording and take it.
    ///
    /// An incomplete character left at the very end is flushed byte by byte
    /// into the last event.
    #[must_use]
    pub fn into_recording(mut self) -> Recording {
        let tail = self.decoder.finish();
        if !tail.is_empty() {
            self.append(0, tail);
        }
        self.recording
    }

    /// Close the recording and serialize it in the default envelope.
    pub fn finalize(self) -> Result<String> {
        self.finalize_with(&Envelope::default())
    }

    /// Close the recording and serialize it in `envelope`.
    pub fn finalize_with(self, envelope: &Envelope) -> Result<String> {
        let recording = self.into_recording();
        tracing::debug!(
            events = recording.events.len(),
            duration_ms = recording.duration_ms(),
            "recording finalized"
        );
        recording.to_envelope(envelope)
    }
}
