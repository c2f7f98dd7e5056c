//! Trial decoding of textual attachments against an ordered encoding list.

use crate::{ExtractError, Result};
use encoding_rs::Encoding;
use tracing::debug;

// ── TextDecoder ──────────────────────────────────────────────────────────────

/// Decodes attachment bytes by trying a fixed, ordered list of encodings.
///
/// A decode attempt succeeds only when every byte of the payload maps to a
/// valid character under that encoding; lossy or partial decodes are never
/// accepted. The first successful attempt wins and the rest of the list is
/// not consulted.
///
/// Ordering is a correctness rule, not a tuning knob: the legacy
/// Central-European codepages assign a character to (nearly) every byte
/// value, so they accept almost any input. UTF-8 has to be tried before
/// them, otherwise valid UTF-8 payloads would be silently mis-decoded
/// through a single-byte table.
///
/// ```
/// use pdfattach::TextDecoder;
///
/// let decoder = TextDecoder::default();
/// assert_eq!(decoder.decode("café".as_bytes()).unwrap(), "café");
///
/// // 0xB3 0xF3 is not valid UTF-8 but is "łó" in ISO-8859-2.
/// assert_eq!(decoder.decode(&[0xB3, 0xF3]).unwrap(), "łó");
/// ```
#[derive(Debug, Clone)]
pub struct TextDecoder {
    encodings: Vec<&'static Encoding>,
}

impl TextDecoder {
    /// Build a decoder with an explicit candidate list, tried in order.
    pub fn with_encodings(encodings: Vec<&'static Encoding>) -> Self {
        Self { encodings }
    }

    /// The candidate encodings, in trial order.
    pub fn encodings(&self) -> &[&'static Encoding] {
        &self.encodings
    }

    /// Decode `data` with the first encoding that accepts all of it.
    ///
    /// Returns [`ExtractError::UndecodableText`] when every candidate
    /// rejects the payload; no partial content is carried in that case.
    pub fn decode(&self, data: &[u8]) -> Result<String> {
        for encoding in &self.encodings {
            let (decoded, had_errors) = encoding.decode_without_bom_handling(data);
            if !had_errors {
                debug!(encoding = encoding.name(), bytes = data.len(), "decoded attachment");
                return Ok(decoded.into_owned());
            }
        }
        Err(ExtractError::UndecodableText)
    }
}

impl Default for TextDecoder {
    /// The default candidate list from [`crate::ExtractorConfig::default`].
    fn default() -> Self {
        Self::with_encodings(crate::ExtractorConfig::default().encodings)
    }
}
