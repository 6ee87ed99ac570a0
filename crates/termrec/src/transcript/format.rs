//! Recording file format.
//!
//! A recording is a single JSON object wrapped in a literal envelope so a
//! companion player can load it as a script:
//!
//! ```text
//! session_recorded({"size":[80,24],"stream":[{"t":"op","d":0,"val":"hello\n"}]});
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{RecordError, Result};

/// Default opening token of the envelope.
pub const DEFAULT_PREFIX: &str = "session_recorded(";

/// Default closing token of the envelope.
pub const DEFAULT_SUFFIX: &str = ");\n";

/// Terminal dimensions, serialized as `[columns, rows]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u16, u16)", into = "(u16, u16)")]
pub struct TerminalSize {
    /// Number of columns.
    pub columns: u16,
    /// Number of rows.
    pub rows: u16,
}

impl TerminalSize {
    /// Create a new size.
    #[must_use]
    pub const fn new(columns: u16, rows: u16) -> Self {
        Self { columns, rows }
    }
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

impl From<(u16, u16)> for TerminalSize {
    fn from((columns, rows): (u16, u16)) -> Self {
        Self::new(columns, rows)
    }
}

impl From<TerminalSize> for (u16, u16) {
    fn from(size: TerminalSize) -> Self {
        (size.columns, size.rows)
    }
}

impl From<termrec_pty::WindowSize> for TerminalSize {
    fn from(size: termrec_pty::WindowSize) -> Self {
        Self::new(size.cols, size.rows)
    }
}

impl std::fmt::Display for TerminalSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.columns, self.rows)
    }
}

/// One timed chunk of shell output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", rename = "op")]
pub struct OutputEvent {
    /// Milliseconds since the previous event (or since session start).
    #[serde(rename = "d")]
    pub delay_ms: u64,
    /// Output text.
    #[serde(rename = "val")]
    pub data: String,
}

impl OutputEvent {
    /// Create an event.
    #[must_use]
    pub fn new(delay_ms: u64, data: impl Into<String>) -> Self {
        Self {
            delay_ms,
            data: data.into(),
        }
    }
}

/// A complete recorded session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    /// Terminal size at session start.
    pub size: TerminalSize,
    /// Output events in the order the PTY delivered them.
    #[serde(rename = "stream")]
    pub events: Vec<OutputEvent>,
}

impl Recording {
    /// Create an empty recording.
    #[must_use]
    pub const fn new(size: TerminalSize) -> Self {
        Self {
            size,
            events: Vec::new(),
        }
    }

    /// Total delay across all events.
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        self.events.iter().map(|e| e.delay_ms).sum()
    }

    /// All output concatenated.
    #[must_use]
    pub fn output_text(&self) -> String {
        self.events.iter().map(|e| e.data.as_str()).collect()
    }

    /// Serialize the bare JSON object.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize wrapped in `envelope`.
    pub fn to_envelope(&self, envelope: &Envelope) -> Result<String> {
        let json = self.to_json()?;
        let mut out =
            String::with_capacity(envelope.prefix.len() + json.len() + envelope.suffix.len());
        out.push_str(&envelope.prefix);
        out.push_str(&json);
        out.push_str(&envelope.suffix);
        Ok(out)
    }

    /// Parse a recording previously written with [`to_envelope`](Self::to_envelope).
    pub fn from_envelope(text: &str, envelope: &Envelope) -> Result<Self> {
        let inner = text
            .strip_prefix(envelope.prefix.as_str())
            .ok_or_else(|| RecordError::envelope(format!("missing prefix {:?}", envelope.prefix)))?
            .strip_suffix(envelope.suffix.as_str())
            .ok_or_else(|| RecordError::envelope(format!("missing suffix {:?}", envelope.suffix)))?;

        Ok(serde_json::from_str(inner)?)
    }
}

/// The literal tokens around a serialized recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Opening token.
    pub prefix: String,
    /// Closing token.
    pub suffix: String,
}

impl Envelope {
    /// Create an envelope with custom tokens.
    #[must_use]
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX, DEFAULT_SUFFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_shape() {
        let mut recording = Recording::new(TerminalSize::new(80, 24));
        recording.events.push(OutputEvent::new(0, "hello\n"));

        assert_eq!(
            recording.to_json().unwrap(),
            r#"{"size":[80,24],"stream":[{"t":"op","d":0,"val":"hello\n"}]}"#
        );
    }

    #[test]
    fn envelope_wraps_json() {
        let recording = Recording::new(TerminalSize::new(100, 30));
        let text = recording.to_envelope(&Envelope::default()).unwrap();

        assert!(text.starts_with("session_recorded({"));
        assert!(text.ends_with("});\n"));
        assert_eq!(Recording::from_envelope(&text, &Envelope::default()).unwrap(), recording);
    }

    #[test]
    fn custom_envelope() {
        let envelope = Envelope::new("var session = ", ";\n");
        let mut recording = Recording::new(TerminalSize::default());
        recording.events.push(OutputEvent::new(12, "\u{1b}[H"));

        let text = recording.to_envelope(&envelope).unwrap();
        assert!(text.starts_with("var session = "));
        assert_eq!(Recording::from_envelope(&text, &envelope).unwrap(), recording);
    }

    #[test]
    fn missing_envelope_rejected() {
        let err = Recording::from_envelope(r#"{"size":[80,24],"stream":[]}"#, &Envelope::default())
            .unwrap_err();
        assert!(matches!(err, RecordError::Envelope { .. }));
    }

    #[test]
    fn output_text_and_duration() {
        let mut recording = Recording::new(TerminalSize::default());
        recording.events.push(OutputEvent::new(0, "ab"));
        recording.events.push(OutputEvent::new(150, "c"));

        assert_eq!(recording.output_text(), "abc");
        assert_eq!(recording.duration_ms(), 150);
        assert_eq!(recording.size.to_string(), "80x24");
    }
}
