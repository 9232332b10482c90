//! Dispatch snapshot persistence
//!
//! Two strategies: a key-value byte cache holding a MessagePack blob, or a
//! JSON file written next to the application. Reading never fails the
//! caller: an unreadable snapshot is a miss and the trees are rebuilt.

use crate::config::RouterConfig;
use crate::dispatch::DispatchTreeSet;
use crate::error::RouteResult;
use ahash::AHashMap;
use bytes::Bytes;
use parking_lot::RwLock;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Key-value byte cache collaborator
pub trait RouteCache: Send + Sync {
    fn has(&self, key: &str) -> RouteResult<bool>;
    fn get(&self, key: &str) -> RouteResult<Option<Bytes>>;
    fn set(&self, key: &str, value: Bytes) -> RouteResult<()>;
}

/// Process-local [`RouteCache`]
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<AHashMap<String, Bytes>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl RouteCache for MemoryCache {
    fn has(&self, key: &str) -> RouteResult<bool> {
        Ok(self.entries.read().contains_key(key))
    }

    fn get(&self, key: &str) -> RouteResult<Option<Bytes>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: Bytes) -> RouteResult<()> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }
}

/// Where the dispatch snapshot lives
#[derive(Clone)]
pub enum SnapshotStore {
    KeyValue { cache: Arc<dyn RouteCache>, key: String },
    File(PathBuf),
}

impl fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotStore::KeyValue { key, .. } => f.debug_struct("KeyValue").field("key", key).finish(),
            SnapshotStore::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}

impl SnapshotStore {
    /// File storage wins when `save_to_file` is set; otherwise the cache is
    /// used if one is supplied and enabled.
    pub fn from_config(config: &RouterConfig, cache: Option<Arc<dyn RouteCache>>) -> Option<Self> {
        if config.save_to_file {
            return Some(SnapshotStore::File(PathBuf::from(&config.cache_path)));
        }
        match cache {
            Some(cache) if config.enable_cache => Some(SnapshotStore::KeyValue {
                cache,
                key: config.cache_key.clone(),
            }),
            _ => None,
        }
    }

    /// Load a snapshot, treating every failure as a miss
    pub fn load(&self) -> Option<DispatchTreeSet> {
        match self.try_load() {
            Ok(Some(set)) => {
                info!(store = ?self, "dispatch trees restored from snapshot");
                Some(set)
            }
            Ok(None) => {
                debug!(store = ?self, "no dispatch snapshot");
                None
            }
            Err(err) => {
                warn!(store = ?self, error = %err, "dispatch snapshot unreadable, rebuilding");
                None
            }
        }
    }

    pub fn try_load(&self) -> RouteResult<Option<DispatchTreeSet>> {
        match self {
            SnapshotStore::KeyValue { cache, key } => {
                if !cache.has(key)? {
                    return Ok(None);
                }
                match cache.get(key)? {
                    Some(blob) => Ok(Some(decode(&blob)?)),
                    None => Ok(None),
                }
            }
            SnapshotStore::File(path) => {
                if !path.is_file() {
                    return Ok(None);
                }
                let content = std::fs::read(path)?;
                Ok(Some(serde_json::from_slice(&content)?))
            }
        }
    }

    /// Persist a snapshot; failures are logged and swallowed
    pub fn save(&self, set: &DispatchTreeSet) {
        match self.try_save(set) {
            Ok(()) => debug!(store = ?self, "dispatch snapshot written"),
            Err(err) => warn!(store = ?self, error = %err, "failed to write dispatch snapshot"),
        }
    }

    pub fn try_save(&self, set: &DispatchTreeSet) -> RouteResult<()> {
        match self {
            SnapshotStore::KeyValue { cache, key } => cache.set(key, Bytes::from(encode(set)?)),
            SnapshotStore::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, serde_json::to_vec_pretty(set)?)?;
                Ok(())
            }
        }
    }
}

/// Encode a snapshot as a MessagePack blob
pub fn encode(set: &DispatchTreeSet) -> RouteResult<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(set)?)
}

/// Decode a blob produced by [`encode`]
pub fn decode(blob: &[u8]) -> RouteResult<DispatchTreeSet> {
    Ok(rmp_serde::from_slice(blob)?)
}
