// ── Attachment ───────────────────────────────────────────────────────────────

/// One file embedded inside a PDF document, before classification.
///
/// Returned by [`crate::DocumentSession::enumerate_attachments`]. Attachments
/// are ordered by their position in the document's embedded-object table;
/// `index` records that position and is the value artifact names are derived
/// from, so it stays stable across runs on the same input.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// 0-based position in the embedded-object table.
    pub index: usize,

    /// The filename as declared in the PDF file specification object
    /// (Unicode name preferred over ASCII name when both are present).
    pub name: String,

    /// The raw, decompressed payload.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` when the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// ── AttachmentOutcome ────────────────────────────────────────────────────────

/// The per-attachment result of an extraction run.
///
/// Every enumerated [`Attachment`] produces exactly one outcome, at the same
/// position in the result sequence as the attachment held in the document's
/// table. One attachment failing never affects its siblings.
///
/// ```
/// use pdfattach::AttachmentOutcome;
///
/// let outcome = AttachmentOutcome::Text { content: "hello".into() };
/// match outcome {
///     AttachmentOutcome::Artifact { name } => println!("download {name}"),
///     AttachmentOutcome::Text { content } => println!("{content}"),
///     AttachmentOutcome::Error { reason } => eprintln!("{reason}"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentOutcome {
    /// A nested PDF, persisted in the artifact store under `name` for
    /// one-time retrieval.
    Artifact { name: String },

    /// A textual attachment, fully decoded.
    Text { content: String },

    /// This attachment could not be processed; `reason` is human-readable.
    Error { reason: String },
}

impl AttachmentOutcome {
    /// Returns the artifact name when this outcome is [`Self::Artifact`].
    pub fn artifact_name(&self) -> Option<&str> {
        match self {
            Self::Artifact { name } => Some(name),
            _ => None,
        }
    }

    /// Returns `true` when this outcome is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}
