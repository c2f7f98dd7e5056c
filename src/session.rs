//! Ownership of one open, possibly password-protected PDF document.

use crate::{Attachment, ExtractError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, warn};

// ── DocumentSession ──────────────────────────────────────────────────────────

/// An open PDF document, exclusively owned for the duration of one
/// extraction.
///
/// A session moves through three stages: [`open`](Self::open),
/// [`authenticate`](Self::authenticate), and
/// [`enumerate_attachments`](Self::enumerate_attachments). Enumeration is
/// refused until authentication has succeeded — for unprotected documents
/// authentication is an unconditional no-op success, but it still has to be
/// called.
///
/// All resources are released when the session is dropped, whichever path the
/// caller exits through; [`close`](Self::close) consumes the session so a
/// closed handle cannot be reused.
///
/// # Example
///
/// ```no_run
/// use pdfattach::DocumentSession;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("report.pdf")?;
/// let mut session = DocumentSession::open(&bytes)?;
/// if !session.authenticate(Some("hunter2")) {
///     return Err("wrong password".into());
/// }
/// for attachment in session.enumerate_attachments()? {
///     println!("#{}: {} ({} bytes)", attachment.index, attachment.name, attachment.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct DocumentSession {
    document: Document,
    authenticated: bool,
}

impl DocumentSession {
    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Parse `bytes` into a session.
    ///
    /// Unparseable input yields [`ExtractError::MalformedDocument`]. Load
    /// failures that the parser attributes to encryption are reported as
    /// [`ExtractError::IncorrectPassword`] instead — the document is locked,
    /// not broken.
    pub fn open(bytes: &[u8]) -> Result<Self> {
        let document = Document::load_mem(bytes).map_err(|e| {
            let msg = e.to_string();
            let lowered = msg.to_ascii_lowercase();
            if lowered.contains("encrypt") || lowered.contains("password") {
                ExtractError::IncorrectPassword
            } else {
                ExtractError::MalformedDocument(msg)
            }
        })?;

        Ok(Self {
            document,
            authenticated: false,
        })
    }

    /// Returns `true` when the document is password-protected.
    pub fn requires_password(&self) -> bool {
        self.document.is_encrypted()
    }

    /// Returns `true` once [`authenticate`](Self::authenticate) has succeeded.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Authenticate the session.
    ///
    /// For an unprotected document this returns `true` unconditionally and
    /// leaves the document untouched. For a protected document it returns
    /// `true` only when `password` decrypts it; `None` (or a wrong password)
    /// returns `false` and leaves the session unauthenticated.
    pub fn authenticate(&mut self, password: Option<&str>) -> bool {
        if self.authenticated {
            return true;
        }

        if !self.document.is_encrypted() {
            self.authenticated = true;
            return true;
        }

        let Some(password) = password else {
            return false;
        };

        match self.document.decrypt(password) {
            Ok(()) => {
                self.authenticated = true;
                true
            }
            Err(e) => {
                debug!(error = %e, "password rejected");
                false
            }
        }
    }

    /// Release the session.
    ///
    /// Dropping the session has the same effect; this method exists so the
    /// handoff is visible at call sites, and because a consumed session is
    /// statically impossible to reuse.
    pub fn close(self) {}

    // ── Enumeration ───────────────────────────────────────────────────────────

    /// Enumerate every attachment in the document, in table order.
    ///
    /// Fails with [`ExtractError::NotAuthenticated`] unless
    /// [`authenticate`](Self::authenticate) has returned `true`. File
    /// specifications that cannot be read are logged and skipped; they never
    /// abort enumeration of their siblings.
    ///
    /// Two sources are searched, in this order:
    /// 1. The `/Names/EmbeddedFiles` name tree in the document catalog.
    /// 2. `/FileAttachment` annotations on every page.
    pub fn enumerate_attachments(&self) -> Result<Vec<Attachment>> {
        if !self.authenticated {
            return Err(ExtractError::NotAuthenticated);
        }

        let mut attachments: Vec<Attachment> = Vec::new();
        for (name, spec_id) in self.collect_file_specs() {
            match self.read_file_spec(&name, spec_id) {
                Ok((filename, data)) => {
                    attachments.push(Attachment {
                        index: attachments.len(),
                        name: filename,
                        data,
                    });
                }
                Err(e) => {
                    warn!(spec = %name, error = %e, "skipping unreadable file specification");
                }
            }
        }

        debug!(count = attachments.len(), "enumerated attachments");
        Ok(attachments)
    }

    // ── Private: file-spec discovery ─────────────────────────────────────────

    /// Collect `(name, ObjectId)` pairs for every embedded-file specification
    /// in the document, preserving table order.
    fn collect_file_specs(&self) -> Vec<(String, ObjectId)> {
        let mut specs = Vec::new();
        specs.extend(self.collect_from_names_tree());
        specs.extend(self.collect_from_annotations());
        specs
    }

    /// Resolve a value that may be inline or an indirect reference to a
    /// dictionary.
    fn resolve_dict(&self, value: &Object) -> Option<Dictionary> {
        if let Ok(id) = value.as_reference() {
            self.document
                .get_object(id)
                .ok()
                .and_then(|o| o.as_dict().ok().cloned())
        } else {
            value.as_dict().ok().cloned()
        }
    }

    /// Resolve a value that may be inline or an indirect reference to an
    /// array.
    fn resolve_array(&self, value: &Object) -> Option<Vec<Object>> {
        if let Ok(id) = value.as_reference() {
            self.document
                .get_object(id)
                .ok()
                .and_then(|o| o.as_array().ok().cloned())
        } else {
            value.as_array().ok().cloned()
        }
    }

    /// File specifications from the catalog's `/Names/EmbeddedFiles` tree.
    fn collect_from_names_tree(&self) -> Vec<(String, ObjectId)> {
        let Ok(catalog) = self.document.catalog() else {
            return Vec::new();
        };
        let Ok(names_val) = catalog.get(b"Names") else {
            return Vec::new();
        };
        let Some(names_dict) = self.resolve_dict(names_val) else {
            return Vec::new();
        };
        let Ok(ef_val) = names_dict.get(b"EmbeddedFiles") else {
            return Vec::new();
        };

        if let Ok(ef_id) = ef_val.as_reference() {
            self.walk_name_tree(ef_id)
        } else if let Ok(ef_dict) = ef_val.as_dict() {
            // Some producers inline the /EmbeddedFiles node.
            ef_dict
                .get(b"Names")
                .ok()
                .and_then(|v| v.as_array().ok())
                .map(|arr| Self::pairs_from_names_array(arr))
                .unwrap_or_default()
        } else {
            Vec::new()
        }
    }

    /// Recursively walk a PDF name tree, collecting
    /// `(name_string, file_spec_object_id)` pairs from leaf nodes.
    fn walk_name_tree(&self, node_id: ObjectId) -> Vec<(String, ObjectId)> {
        let mut out = Vec::new();

        let Some(node_dict) = self
            .document
            .get_object(node_id)
            .ok()
            .and_then(|o| o.as_dict().ok())
        else {
            return out;
        };

        // Leaf node: /Names is a flat [key, value, key, value, …] array.
        if let Ok(arr) = node_dict.get(b"Names").and_then(|v| v.as_array()) {
            out.extend(Self::pairs_from_names_array(arr));
        }

        // Intermediate node: /Kids is an array of child references.
        if let Ok(kids) = node_dict.get(b"Kids").and_then(|v| v.as_array()) {
            for kid in kids {
                if let Ok(kid_id) = kid.as_reference() {
                    out.extend(self.walk_name_tree(kid_id));
                }
            }
        }

        out
    }

    /// Extract `(name, ObjectId)` pairs from a name-tree `/Names` array.
    fn pairs_from_names_array(arr: &[Object]) -> Vec<(String, ObjectId)> {
        let mut pairs = Vec::new();
        let mut i = 0;
        while i + 1 < arr.len() {
            if let Ok(raw) = arr[i].as_str() {
                let name = String::from_utf8_lossy(raw).into_owned();
                if let Ok(spec_id) = arr[i + 1].as_reference() {
                    pairs.push((name, spec_id));
                }
            }
            i += 2;
        }
        pairs
    }

    /// File specifications referenced by `/FileAttachment` page annotations.
    fn collect_from_annotations(&self) -> Vec<(String, ObjectId)> {
        let mut specs = Vec::new();

        for page_id in self.document.get_pages().values() {
            let Some(annots) = self
                .document
                .get_object(*page_id)
                .ok()
                .and_then(|o| o.as_dict().ok())
                .and_then(|d| d.get(b"Annots").ok())
                .and_then(|v| self.resolve_array(v))
            else {
                continue;
            };

            for item in &annots {
                if let Ok(annot_id) = item.as_reference() {
                    if let Some(spec) = self.file_attachment_spec(annot_id) {
                        specs.push(spec);
                    }
                }
            }
        }

        specs
    }

    /// Read one annotation; `Some` only for `/FileAttachment` annotations
    /// carrying a file-specification reference.
    fn file_attachment_spec(&self, annot_id: ObjectId) -> Option<(String, ObjectId)> {
        let dict = self.document.get_object(annot_id).ok()?.as_dict().ok()?;

        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"FileAttachment" {
            return None;
        }

        let fs_id = dict.get(b"FS").ok()?.as_reference().ok()?;
        Some((Self::annotation_name(dict), fs_id))
    }

    /// Display name for a FileAttachment annotation: `/Contents`, then `/T`,
    /// then a fixed fallback.
    fn annotation_name(dict: &Dictionary) -> String {
        for key in [b"Contents" as &[u8], b"T"] {
            if let Ok(s) = dict.get(key).and_then(|v| v.as_str()) {
                let name = String::from_utf8_lossy(s).into_owned();
                if !name.is_empty() {
                    return name;
                }
            }
        }
        "attachment".into()
    }

    // ── Private: file-spec reading ───────────────────────────────────────────

    /// Read a file-specification object: resolve `/EF`, follow its stream
    /// reference, and return `(filename, payload bytes)`.
    ///
    /// Layout of a file specification (PDF spec §7.11.3):
    ///
    /// ```text
    /// <<
    ///   /Type  /Filespec
    ///   /F     (ascii filename)
    ///   /UF    (unicode filename)          ← preferred
    ///   /EF    <<
    ///              /F   <stream-ref>       ← the actual data stream
    ///              /UF  <stream-ref>       ← alternative key, same stream
    ///          >>
    /// >>
    /// ```
    fn read_file_spec(&self, name: &str, spec_id: ObjectId) -> Result<(String, Vec<u8>)> {
        let spec_obj = self.document.get_object(spec_id)?;
        let spec_dict = spec_obj
            .as_dict()
            .map_err(|_| Self::spec_error(name, "file spec is not a dictionary"))?;

        // /EF is normally an inline dictionary, but some producers store a
        // reference — handle both.
        let ef_val = spec_dict
            .get(b"EF")
            .map_err(|_| Self::spec_error(name, "missing /EF entry"))?;
        let ef_dict = self
            .resolve_dict(ef_val)
            .ok_or_else(|| Self::spec_error(name, "/EF is not a dictionary"))?;

        // /UF preferred over /F (unicode vs. ASCII path).
        let stream_id = ef_dict
            .get(b"UF")
            .or_else(|_| ef_dict.get(b"F"))
            .map_err(|_| Self::spec_error(name, "/EF has neither /F nor /UF"))?
            .as_reference()
            .map_err(|_| Self::spec_error(name, "/EF stream entry is not a reference"))?;

        let stream = self
            .document
            .get_object(stream_id)?
            .as_stream()
            .map_err(|_| Self::spec_error(name, "embedded object is not a stream"))?;

        // Filters that lopdf cannot apply leave the raw content as-is.
        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        Ok((Self::best_filename(spec_dict, name), data))
    }

    /// Best available filename: Unicode (`/UF`) > ASCII (`/F`) > fallback.
    fn best_filename(spec_dict: &Dictionary, fallback: &str) -> String {
        for key in [b"UF" as &[u8], b"F"] {
            if let Ok(s) = spec_dict.get(key).and_then(|v| v.as_str()) {
                let name = String::from_utf8_lossy(s).into_owned();
                if !name.is_empty() {
                    return name;
                }
            }
        }
        fallback.into()
    }

    fn spec_error(name: &str, reason: &str) -> ExtractError {
        ExtractError::MalformedDocument(format!("file spec '{name}': {reason}"))
    }
}
