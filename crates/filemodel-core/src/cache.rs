//! Identity map from absolute path to model handle
//!
//! The cache guarantees at most one live node per file within a load
//! context. An entry goes stale when the file's content hash changes, not
//! when its timestamp does.

use crate::arena::ModelId;
use filemodel_fs::{ChecksumSource, Sha256Checksum, normalize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// A cached handle and the content hash recorded when it was registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub id: ModelId,
    pub checksum: Option<String>,
}

/// Non-owning map from normalized absolute path to model handle.
pub struct ModelCache {
    entries: HashMap<PathBuf, CacheEntry>,
    source: Box<dyn ChecksumSource>,
}

impl fmt::Debug for ModelCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelCache")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelCache {
    /// Create a cache that hashes file content with SHA-256.
    pub fn new() -> Self {
        Self::with_source(Box::new(Sha256Checksum))
    }

    pub fn with_source(source: Box<dyn ChecksumSource>) -> Self {
        Self {
            entries: HashMap::new(),
            source,
        }
    }

    fn key(path: &Path) -> PathBuf {
        normalize(path)
    }

    /// The cached handle for `path`, without any staleness check.
    pub fn lookup(&self, path: &Path) -> Option<ModelId> {
        self.entries.get(&Self::key(path)).map(|entry| entry.id)
    }

    /// Record `id` for `path` along with the file's current hash.
    pub fn register(&mut self, path: &Path, id: ModelId) {
        let key = Self::key(path);
        let checksum = self.source.checksum(&key);
        tracing::trace!(path = %key.display(), %id, "Register model");
        self.entries.insert(key, CacheEntry { id, checksum });
    }

    /// True if `path` is not cached or its content hash moved on.
    pub fn has_changed(&self, path: &Path) -> bool {
        let key = Self::key(path);
        match self.entries.get(&key) {
            None => true,
            Some(entry) => self.source.checksum(&key) != entry.checksum,
        }
    }

    /// Remove the entry for `path`.
    pub fn forget(&mut self, path: &Path) -> Option<CacheEntry> {
        self.entries.remove(&Self::key(path))
    }

    /// Drop every entry whose handle is no longer live.
    pub fn prune(&mut self, is_live: impl Fn(ModelId) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| is_live(entry.id));
        before - self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
