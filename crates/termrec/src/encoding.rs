//! Best-effort UTF-8 decoding of terminal output.
//!
//! Terminal output is mostly UTF-8 but is read in fixed-size chunks, so a
//! multi-byte character can straddle two reads, and control sequences may
//! carry bytes that are not UTF-8 at all. [`Utf8Normalizer`] turns each chunk
//! into text without losing a byte:
//!
//! - valid UTF-8 passes through unchanged
//! - an incomplete sequence at the end of a chunk is held back and completed
//!   by the next chunk
//! - a byte that can never start or continue a valid sequence becomes the
//!   code point with the same value (`0x9b` becomes U+009B), never U+FFFD

/// Maximum length of a UTF-8 sequence, and so of the carried tail.
const MAX_SEQUENCE_LEN: usize = 4;

/// Stateful chunk decoder.
#[derive(Debug, Clone, Default)]
pub struct Utf8Normalizer {
    /// Bytes of an incomplete sequence from the previous chunk.
    carry: Vec<u8>,
}

impl Utf8Normalizer {
    /// Create a decoder with nothing carried over.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes currently held back.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.carry.len()
    }

    /// Decode one chunk.
    ///
    /// The result can be empty when the chunk only extends an incomplete
    /// sequence.
    pub fn push(&mut self, chunk: &[u8]) -> String {
        let joined;
        let bytes = if self.carry.is_empty() {
            chunk
        } else {
            self.carry.extend_from_slice(chunk);
            joined = std::mem::take(&mut self.carry);
            joined.as_slice()
        };

        let mut text = String::with_capacity(bytes.len());
        let mut i = 0;

        while i < bytes.len() {
            match std::str::from_utf8(&bytes[i..]) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    if let Ok(valid) = std::str::from_utf8(&bytes[i..i + valid_up_to]) {
                        text.push_str(valid);
                    }
                    i += valid_up_to;

                    if let Some(error_len) = e.error_len() {
                        push_raw(&mut text, &bytes[i..i + error_len]);
                        i += error_len;
                    } else {
                        // Truncated sequence at the end, wait for the rest
                        self.carry.extend_from_slice(&bytes[i..]);
                        debug_assert!(self.carry.len() < MAX_SEQUENCE_LEN);
                        break;
                    }
                }
            }
        }

        text
    }

    /// Flush a dangling incomplete sequence, byte by byte.
    pub fn finish(&mut self) -> String {
        let mut text = String::new();
        push_raw(&mut text, &self.carry);
        self.carry.clear();
        text
    }
}

/// Decode a whole buffer at once.
#[must_use]
pub fn decode_best_effort(bytes: &[u8]) -> String {
    let mut decoder = Utf8Normalizer::new();
    let mut text = decoder.push(bytes);
    text.push_str(&decoder.finish());
    text
}

/// Map raw bytes to the code points of the same value.
fn push_raw(text: &mut String, bytes: &[u8]) {
    text.extend(bytes.iter().map(|&b| char::from(b)));
}
