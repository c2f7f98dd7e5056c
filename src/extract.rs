//! The extraction pipeline: open → authenticate → enumerate → classify each
//! attachment into text, a stored artifact, or a per-attachment error.

use crate::classify::{classify, PayloadKind};
use crate::decode::TextDecoder;
use crate::session::DocumentSession;
use crate::store::ArtifactStore;
use crate::{AttachmentOutcome, ExtractError, ExtractorConfig, Result};
use tracing::{debug, warn};

// ── AttachmentExtractor ──────────────────────────────────────────────────────

/// Entry point for whole-document attachment extraction.
///
/// One call to [`extract`](Self::extract) processes one document start to
/// finish, synchronously. Concurrent calls over independent documents are
/// fine; the only shared state is the [`ArtifactStore`], whose operations
/// are atomic.
///
/// # Example
///
/// ```no_run
/// use pdfattach::{AttachmentExtractor, ExtractorConfig, MemoryStore};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("report.pdf")?;
/// let store = MemoryStore::new();
///
/// let extractor = AttachmentExtractor::with_config(ExtractorConfig {
///     max_attachment_size: Some(10 * 1024 * 1024),
///     ..Default::default()
/// });
/// let outcomes = extractor.extract(&bytes, Some("hunter2"), &store)?;
/// println!("{} attachment(s)", outcomes.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct AttachmentExtractor {
    config: ExtractorConfig,
}

impl AttachmentExtractor {
    /// Extractor with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extractor with a custom [`ExtractorConfig`].
    pub fn with_config(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract every attachment from `bytes`.
    ///
    /// Terminal failures abort the whole call:
    /// [`ExtractError::MalformedDocument`] when the bytes do not parse,
    /// [`ExtractError::IncorrectPassword`] when authentication fails, and
    /// [`ExtractError::NoAttachments`] when the document has none.
    ///
    /// Everything after that is per-attachment: the returned sequence has
    /// one [`AttachmentOutcome`] per attachment, in table order, and a
    /// failing attachment (undecodable text, store collision, oversize
    /// payload) is recorded at its position without affecting its siblings.
    ///
    /// The document session is released on every path out of this function.
    pub fn extract(
        &self,
        bytes: &[u8],
        password: Option<&str>,
        store: &dyn ArtifactStore,
    ) -> Result<Vec<AttachmentOutcome>> {
        let mut session = DocumentSession::open(bytes)?;

        if !session.authenticate(password) {
            return Err(ExtractError::IncorrectPassword);
        }

        let attachments = session.enumerate_attachments()?;
        if attachments.is_empty() {
            return Err(ExtractError::NoAttachments);
        }

        let decoder = TextDecoder::with_encodings(self.config.encodings.clone());
        let mut outcomes = Vec::with_capacity(attachments.len());

        for attachment in &attachments {
            if let Some(max) = self.config.max_attachment_size {
                if attachment.len() > max {
                    warn!(
                        index = attachment.index,
                        bytes = attachment.len(),
                        "attachment exceeds the configured size cap"
                    );
                    outcomes.push(AttachmentOutcome::Error {
                        reason: ExtractError::AttachmentTooLarge.to_string(),
                    });
                    continue;
                }
            }

            let outcome = match classify(&attachment.data) {
                PayloadKind::NestedPdf => match store.put(attachment.index, &attachment.data) {
                    Ok(name) => AttachmentOutcome::Artifact { name },
                    Err(e) => {
                        warn!(index = attachment.index, error = %e, "failed to store artifact");
                        AttachmentOutcome::Error {
                            reason: e.to_string(),
                        }
                    }
                },
                PayloadKind::Text => match decoder.decode(&attachment.data) {
                    Ok(content) => AttachmentOutcome::Text { content },
                    Err(e) => AttachmentOutcome::Error {
                        reason: e.to_string(),
                    },
                },
            };

            debug!(
                index = attachment.index,
                name = %attachment.name,
                kind = outcome_kind(&outcome),
                "processed attachment"
            );
            outcomes.push(outcome);
        }

        session.close();
        Ok(outcomes)
    }
}

fn outcome_kind(outcome: &AttachmentOutcome) -> &'static str {
    match outcome {
        AttachmentOutcome::Artifact { .. } => "artifact",
        AttachmentOutcome::Text { .. } => "text",
        AttachmentOutcome::Error { .. } => "error",
    }
}
