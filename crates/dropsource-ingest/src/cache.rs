//! Payload caches keyed by remote object id.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use dashmap::{DashMap, DashSet};

use dropsource_core::{CacheError, PayloadCache, PayloadRef, RecordId};

/// Prefix of every cache key.
pub const CACHE_KEY_PREFIX: &str = "dropbox-file-";

/// Cache key for a record's payload.
pub fn cache_key(id: &RecordId) -> String {
    format!("{CACHE_KEY_PREFIX}{id}")
}

/// In-memory cache, safe for concurrent use.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, PayloadRef>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted copy of all entries.
    pub fn snapshot(&self) -> BTreeMap<String, PayloadRef> {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }
}

impl PayloadCache for MemoryCache {
    fn get(&self, key: &str) -> Option<PayloadRef> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    fn set(&self, key: &str, payload: PayloadRef) {
        self.entries.insert(key.to_string(), payload);
    }
}

impl FromIterator<(String, PayloadRef)> for MemoryCache {
    fn from_iter<I: IntoIterator<Item = (String, PayloadRef)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Memory cache persisted to a JSON file between runs.
///
/// Keys read or written since [`JsonFileCache::open`] are tracked so that
/// entries for files no longer listed can be dropped with
/// [`JsonFileCache::prune_unused`].
#[derive(Debug)]
pub struct JsonFileCache {
    path: PathBuf,
    inner: MemoryCache,
    used: DashSet<String>,
}

impl JsonFileCache {
    /// Load the cache file; a missing file yields an empty cache.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();
        let inner = match fs::read(&path) {
            Ok(bytes) => {
                let entries: BTreeMap<String, PayloadRef> = serde_json::from_slice(&bytes)
                    .map_err(|source| CacheError::Corrupt {
                        path: path.clone(),
                        source,
                    })?;
                entries.into_iter().collect()
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => MemoryCache::new(),
            Err(source) => return Err(CacheError::Io { path, source }),
        };
        tracing::debug!(target: "cache", path = %path.display(), entries = inner.len(), "loaded payload cache");
        Ok(Self {
            path,
            inner,
            used: DashSet::new(),
        })
    }

    /// Location of the cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop entries not read or written since the cache was opened.
    ///
    /// Returns the number of entries removed.
    pub fn prune_unused(&self) -> usize {
        let before = self.inner.len();
        self.inner.entries.retain(|key, _| self.used.contains(key));
        let removed = before - self.inner.len();
        if removed > 0 {
            tracing::debug!(target: "cache", removed, "pruned unused cache entries");
        }
        removed
    }

    /// Write the cache to disk, replacing the previous file atomically.
    pub fn flush(&self) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }

        let json = serde_json::to_vec_pretty(&self.inner.snapshot()).map_err(|source| {
            CacheError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| io_error(&self.path, e))?;
        Ok(())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> CacheError {
    CacheError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl PayloadCache for JsonFileCache {
    fn get(&self, key: &str) -> Option<PayloadRef> {
        let hit = self.inner.get(key);
        if hit.is_some() {
            self.used.insert(key.to_string());
        }
        hit
    }

    fn set(&self, key: &str, payload: PayloadRef) {
        self.used.insert(key.to_string());
        self.inner.set(key, payload);
    }
}
