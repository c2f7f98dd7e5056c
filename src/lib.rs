//! # pdfattach
//!
//! A Rust library for pulling attachments out of PDF documents.
//!
//! ## What this crate does
//!
//! 1. **Open PDF** — parses the document bytes and, for protected documents,
//!    authenticates with a password.
//! 2. **Enumerate attachments** — walks the PDF name tree and page annotations
//!    to find every embedded file, in table order.
//! 3. **Classify payloads** — a payload starting with the `%PDF` signature is a
//!    nested PDF; anything else is candidate text.
//! 4. **Decode or persist** — candidate text is decoded against an ordered
//!    encoding list (UTF-8 first, then legacy Central-European codepages);
//!    nested PDFs are handed to an [`ArtifactStore`] for one-time retrieval.
//!
//! ## Quick example
//!
//! ```no_run
//! use pdfattach::{AttachmentExtractor, AttachmentOutcome, MemoryStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("report.pdf")?;
//! let store = MemoryStore::new();
//!
//! let extractor = AttachmentExtractor::new();
//! for outcome in extractor.extract(&bytes, None, &store)? {
//!     match outcome {
//!         AttachmentOutcome::Text { content } => println!("text: {content}"),
//!         AttachmentOutcome::Artifact { name } => println!("stored: {name}"),
//!         AttachmentOutcome::Error { reason } => println!("failed: {reason}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Stored artifacts are retrieved exactly once with [`ArtifactStore::take`],
//! which deletes on success — retrieval and extraction are decoupled, with the
//! artifact name ferried between them by the caller.

use encoding_rs::{Encoding, ISO_8859_2, UTF_8, WINDOWS_1250};
use thiserror::Error;

mod attachment;
mod classify;
mod decode;
mod extract;
mod session;
mod store;

pub use attachment::{Attachment, AttachmentOutcome};
pub use classify::{classify, PayloadKind, PDF_MAGIC};
pub use decode::TextDecoder;
pub use extract::AttachmentExtractor;
pub use session::DocumentSession;
pub use store::{artifact_name, ArtifactStore, DirStore, MemoryStore};

// ── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration for [`AttachmentExtractor`].
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Candidate encodings for textual attachments, tried in order.
    ///
    /// The first encoding that decodes the *entire* payload without error
    /// wins. UTF-8 must stay first in any custom list: the legacy codepages
    /// accept arbitrary byte sequences, so anything after them is
    /// unreachable and valid UTF-8 input would be silently mis-decoded.
    pub encodings: Vec<&'static Encoding>,

    /// If set, any single attachment larger than this byte count is recorded
    /// as a per-attachment error instead of being decoded or stored.
    pub max_attachment_size: Option<usize>,
}

impl Default for ExtractorConfig {
    /// UTF-8, then ISO-8859-2, then windows-1250; no size cap.
    fn default() -> Self {
        Self {
            encodings: vec![UTF_8, ISO_8859_2, WINDOWS_1250],
            max_attachment_size: None,
        }
    }
}

// ── Error type ───────────────────────────────────────────────────────────────

/// Every error that this crate can produce.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// A filesystem I/O error occurred (e.g. in a directory-backed store).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input bytes do not form a parseable PDF document.
    #[error("Malformed PDF document: {0}")]
    MalformedDocument(String),

    /// The document is password-protected and the supplied password (or the
    /// absence of one) did not authenticate it.
    #[error("Incorrect password")]
    IncorrectPassword,

    /// Attachments were requested from a session that has not successfully
    /// authenticated.
    #[error("Document session is not authenticated")]
    NotAuthenticated,

    /// The document was parsed successfully but contains no attachments.
    #[error("No attachments found in this PDF")]
    NoAttachments,

    /// A textual attachment could not be decoded by any configured encoding.
    #[error("Unable to decode attachment with any of the configured encodings")]
    UndecodableText,

    /// An attachment exceeds [`ExtractorConfig::max_attachment_size`].
    #[error("Attachment exceeds the configured maximum size")]
    AttachmentTooLarge,

    /// An artifact with the same name already exists in the store.
    #[error("Artifact '{0}' already exists in the store")]
    ArtifactNameCollision(String),

    /// The requested artifact does not exist (or was already taken).
    #[error("Artifact '{0}' not found")]
    ArtifactNotFound(String),

    /// The underlying lopdf parser returned an error.
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ExtractError>;
