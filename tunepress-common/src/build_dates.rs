//! Stable "last updated" timestamps for generated content
//!
//! Feed generators need a per-record "last modified" value that only moves
//! when the record content actually changes. Rebuilding a site touches
//! every file, so mtimes are useless for this. Instead each key maps to the
//! SHA-256 of its content plus the time that hash was first seen.
//!
//! The store is passed explicitly to whoever needs it; nothing here keeps
//! global state.

use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Stored state for one key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDateEntry {
    /// SHA-256 of the content, lowercase hex
    pub content_hash: String,
    /// When this hash was first recorded
    pub last_updated: DateTime<Utc>,
}

/// Key → [`BuildDateEntry`] storage
pub trait BuildDateStore: Send {
    fn get(&self, key: &str) -> Option<BuildDateEntry>;

    fn put(&mut self, key: &str, entry: BuildDateEntry);

    /// Persist pending changes. No-op for stores without a backing file.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Compute SHA-256 hex digest of content
pub fn content_hash(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}

/// Return the stable "last updated" time for `key`
///
/// If the stored hash matches `content`, the stored timestamp is returned
/// untouched. Otherwise `now` is recorded together with the new hash.
pub fn stable_last_updated(
    store: &mut dyn BuildDateStore,
    key: &str,
    content: &[u8],
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let hash = content_hash(content);

    if let Some(entry) = store.get(key) {
        if entry.content_hash == hash {
            debug!(key = %key, "Content unchanged, keeping build date");
            return entry.last_updated;
        }
    }

    debug!(key = %key, hash = %hash, "Content changed, recording new build date");
    store.put(
        key,
        BuildDateEntry {
            content_hash: hash,
            last_updated: now,
        },
    );
    now
}

/// In-memory store (nothing survives the process)
#[derive(Debug, Default)]
pub struct MemoryBuildDateStore {
    entries: BTreeMap<String, BuildDateEntry>,
}

impl MemoryBuildDateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl BuildDateStore for MemoryBuildDateStore {
    fn get(&self, key: &str) -> Option<BuildDateEntry> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, entry: BuildDateEntry) {
        self.entries.insert(key.to_string(), entry);
    }
}

/// JSON-file-backed store
///
/// Loaded once on open, written back on [`BuildDateStore::flush`] only if
/// something changed.
#[derive(Debug)]
pub struct JsonFileBuildDateStore {
    path: PathBuf,
    entries: BTreeMap<String, BuildDateEntry>,
    dirty: bool,
}

impl JsonFileBuildDateStore {
    /// Open the store at `path`
    ///
    /// A missing file starts empty. An unreadable or corrupt file is logged
    /// and replaced on the next flush.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Discarding corrupt build-date cache {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("Cannot read build-date cache {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        Self {
            path,
            entries,
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BuildDateStore for JsonFileBuildDateStore {
    fn get(&self, key: &str) -> Option<BuildDateEntry> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, entry: BuildDateEntry) {
        self.entries.insert(key.to_string(), entry);
        self.dirty = true;
    }

    fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, json)?;
        self.dirty = false;

        debug!(path = %self.path.display(), entries = self.entries.len(), "Build-date cache written");
        Ok(())
    }
}
