//! Artifact persistence for nested-PDF attachments.
//!
//! Extraction and retrieval are decoupled: `extract` stores a nested PDF and
//! hands back only its artifact name; a later caller redeems that name with
//! [`ArtifactStore::take`], which deletes the artifact on success. Artifacts
//! that are never taken are reclaimed by an external janitor or a TTL at the
//! backing layer — the store itself only guarantees delete-on-take.

use crate::{ExtractError, Result};
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Derive the artifact name for the attachment at `index`.
///
/// The name is deterministic and safe to embed in a URL path segment.
///
/// ```
/// assert_eq!(pdfattach::artifact_name(1), "attachment_1.pdf");
/// ```
pub fn artifact_name(index: usize) -> String {
    format!("attachment_{index}.pdf")
}

/// Returns `true` when `name` cannot escape a store directory.
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

// ── ArtifactStore ────────────────────────────────────────────────────────────

/// Persistence for binary extraction results.
///
/// Implementations must make `put`'s collision check and `take`'s
/// read-and-delete atomic with respect to concurrent callers: two `put`s for
/// the same derived name must not both succeed, and two `take`s for the same
/// name must not both succeed.
pub trait ArtifactStore: Send + Sync {
    /// Store `data` under the name derived from `index` and return that name.
    ///
    /// Fails with [`ExtractError::ArtifactNameCollision`] if an artifact with
    /// the derived name already exists; an existing artifact is never
    /// silently overwritten.
    fn put(&self, index: usize, data: &[u8]) -> Result<String>;

    /// Read the named artifact and delete it, as one logical operation.
    ///
    /// At most one caller succeeds for a given artifact; every later call
    /// fails with [`ExtractError::ArtifactNotFound`]. Deletion is not
    /// contingent on what the caller does with the bytes afterwards.
    fn take(&self, name: &str) -> Result<Vec<u8>>;
}

// ── MemoryStore ──────────────────────────────────────────────────────────────

/// In-memory [`ArtifactStore`] backed by a mutex-guarded map.
///
/// The backing of choice for tests and for embedding the extraction core in
/// a process that streams artifacts straight back out.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of artifacts currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` when no artifacts are held.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A poisoned lock only means another thread panicked mid-operation;
        // the map itself is still a consistent key→bytes snapshot.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ArtifactStore for MemoryStore {
    fn put(&self, index: usize, data: &[u8]) -> Result<String> {
        let name = artifact_name(index);
        let mut entries = self.lock();
        if entries.contains_key(&name) {
            return Err(ExtractError::ArtifactNameCollision(name));
        }
        entries.insert(name.clone(), data.to_vec());
        debug!(artifact = %name, bytes = data.len(), "stored artifact");
        Ok(name)
    }

    fn take(&self, name: &str) -> Result<Vec<u8>> {
        self.lock()
            .remove(name)
            .ok_or_else(|| ExtractError::ArtifactNotFound(name.to_string()))
    }
}

// ── DirStore ─────────────────────────────────────────────────────────────────

/// Filesystem-backed [`ArtifactStore`]: one file per artifact under a root
/// directory.
///
/// `put` creates the file with `create_new`, so the collision check is a
/// single atomic filesystem operation. `take` claims the artifact by
/// renaming it first — rename is atomic, so of two concurrent `take`s only
/// one finds the file — then reads and deletes the claimed copy.
#[derive(Debug)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open a store rooted at `root`, creating the directory if necessary.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The directory artifacts are stored under.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactStore for DirStore {
    fn put(&self, index: usize, data: &[u8]) -> Result<String> {
        let name = artifact_name(index);
        let path = self.root.join(&name);

        let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(ExtractError::ArtifactNameCollision(name));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(data)?;

        debug!(artifact = %name, bytes = data.len(), "stored artifact");
        Ok(name)
    }

    fn take(&self, name: &str) -> Result<Vec<u8>> {
        // Client-supplied names end up in filesystem paths; anything that
        // could escape the root is treated as absent, not as an error class
        // of its own.
        if !is_safe_name(name) {
            return Err(ExtractError::ArtifactNotFound(name.to_string()));
        }

        let path = self.root.join(name);
        let claimed = self.root.join(format!("{name}.taken"));

        // Atomic claim: the second of two racing callers sees NotFound here.
        match fs::rename(&path, &claimed) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ExtractError::ArtifactNotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        let data = fs::read(&claimed);
        // Delete unconditionally; the artifact is spent whether or not the
        // read (or whatever the caller streams the bytes into) succeeded.
        if let Err(e) = fs::remove_file(&claimed) {
            warn!(artifact = %name, error = %e, "failed to delete claimed artifact");
        }

        Ok(data?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names_are_path_segment_safe() {
        for i in [0, 1, 17, 4096] {
            assert!(is_safe_name(&artifact_name(i)));
        }
    }

    #[test]
    fn traversal_names_are_rejected() {
        for name in ["../secret", "a/b.pdf", "..", "", "c\\d.pdf"] {
            assert!(!is_safe_name(name), "accepted {name:?}");
        }
    }

    #[test]
    fn memory_put_take_roundtrip() {
        let store = MemoryStore::new();
        let name = store.put(0, b"payload").unwrap();
        assert_eq!(name, "attachment_0.pdf");
        assert_eq!(store.take(&name).unwrap(), b"payload");
    }

    #[test]
    fn memory_second_take_fails() {
        let store = MemoryStore::new();
        let name = store.put(3, b"x").unwrap();
        store.take(&name).unwrap();
        assert!(matches!(
            store.take(&name),
            Err(ExtractError::ArtifactNotFound(_))
        ));
    }

    #[test]
    fn memory_put_refuses_collision() {
        let store = MemoryStore::new();
        store.put(1, b"first").unwrap();
        assert!(matches!(
            store.put(1, b"second"),
            Err(ExtractError::ArtifactNameCollision(_))
        ));
        // The original is untouched.
        assert_eq!(store.take("attachment_1.pdf").unwrap(), b"first");
    }
}
