//! Tagged cache backend
//!
//! Entries are permanent until deleted by id or invalidated through one of
//! their tags. Values are stored as JSON so callers can cache any
//! serializable classification result.

use moka::sync::Cache;
use nodeorder_storage::{Result, StorageError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Tag carried by every entry this crate writes
pub const CACHE_TAG: &str = "nodeorder";

/// Cache collaborator supplied by the host
pub trait CacheBackend: Send + Sync {
    /// Cached data for `cid`, if any
    fn get(&self, cid: &str) -> Option<Value>;

    /// Store `data` under `cid`, replacing any previous entry
    fn set(&self, cid: &str, data: Value, tags: &[&str]);

    /// Drop the listed entries
    fn delete(&self, cids: &[&str]);

    /// Drop every entry carrying at least one of `tags`
    fn invalidate_tags(&self, tags: &[&str]) -> Result<()>;
}

/// Read `cid` and decode it; undecodable data counts as a miss
pub fn get_typed<T: DeserializeOwned>(backend: &dyn CacheBackend, cid: &str) -> Option<T> {
    let value = backend.get(cid)?;
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            tracing::debug!(cid, error = %err, "discarding undecodable cache entry");
            None
        }
    }
}

/// Encode `data` and store it under `cid`
pub fn set_typed<T: Serialize>(
    backend: &dyn CacheBackend,
    cid: &str,
    data: &T,
    tags: &[&str],
) -> Result<()> {
    backend.set(cid, serde_json::to_value(data)?, tags);
    Ok(())
}

/// Cache backend sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Entry cap; beyond it the least useful entries are recomputed on demand
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 10_000 }
    }
}

#[derive(Debug)]
struct CacheEntry {
    data: Value,
    tags: Vec<String>,
}

/// moka-backed [`CacheBackend`]
///
/// Tag invalidation registers a moka invalidation predicate; matching
/// entries are never returned once the predicate is registered.
#[derive(Clone)]
pub struct MokaCacheBackend {
    cache: Cache<String, Arc<CacheEntry>>,
}

impl MokaCacheBackend {
    pub fn new(config: CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .support_invalidation_closures()
            .build();
        Self { cache }
    }

    /// Approximate number of live entries
    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

impl Default for MokaCacheBackend {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl CacheBackend for MokaCacheBackend {
    fn get(&self, cid: &str) -> Option<Value> {
        self.cache.get(cid).map(|entry| entry.data.clone())
    }

    fn set(&self, cid: &str, data: Value, tags: &[&str]) {
        let entry = CacheEntry {
            data,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        };
        self.cache.insert(cid.to_string(), Arc::new(entry));
    }

    fn delete(&self, cids: &[&str]) {
        for cid in cids {
            self.cache.invalidate(*cid);
        }
    }

    fn invalidate_tags(&self, tags: &[&str]) -> Result<()> {
        let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
        self.cache
            .invalidate_entries_if(move |_cid, entry| entry.tags.iter().any(|t| tags.contains(t)))
            .map_err(|e| StorageError::cache(format!("tag invalidation rejected: {}", e)))?;
        Ok(())
    }
}
