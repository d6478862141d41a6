//! Persistent response cache with a never-expiring stale shadow per key.
//!
//! Primary entries live in memory and are mirrored into the backend as a
//! single serialized map. Every successful `set` also writes a shadow copy
//! under `stale_{key}` that is only replaced by a newer `set`, so the last
//! good payload outlives the entry's TTL.
//!
//! The cache never fails its caller. Backend errors are logged and the
//! in-memory state keeps serving.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::config::{CACHE_STORAGE_KEY, EVICT_BATCH, LAST_UPDATE_KEY, STALE_PREFIX};
use crate::errors::StorageError;
use crate::models::CacheEntry;
use crate::store::KvStore;


pub struct PersistentCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    shadows: RwLock<HashMap<String, Value>>,
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    evict_batch: usize,
}

impl PersistentCache {
    pub async fn open(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self::open_with_evict_batch(store, clock, EVICT_BATCH).await
    }

    pub async fn open_with_evict_batch(
        store: Arc<dyn KvStore>,
        clock: Arc<dyn Clock>,
        evict_batch: usize,
    ) -> Self {
        let cache = Self {
            entries: RwLock::new(HashMap::new()),
            shadows: RwLock::new(HashMap::new()),
            store,
            clock,
            evict_batch,
        };
        cache.load().await;
        cache
    }

    async fn load(&self) {
        let raw = match self.store.get(CACHE_STORAGE_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                error!("error loading cache from storage: {}", e);
                return;
            }
        };
        match serde_json::from_str::<HashMap<String, CacheEntry>>(&raw) {
            Ok(loaded) => {
                debug!(entries = loaded.len(), "loaded cache from storage");
                *self.entries.write().await = loaded;
            }
            Err(e) => {
                error!("corrupt cache in storage, resetting: {}", e);
                let mut entries = self.entries.write().await;
                entries.clear();
                self.persist(&mut entries).await;
            }
        }
    }

    /// Value for `key` if an unexpired entry exists. An expired entry found
    /// here is removed.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let now = self.clock.now_millis();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if entry.is_valid(now) => {
                    debug!(key, "cache hit");
                    return Some(entry.value.clone());
                }
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        // Re-check: a concurrent set may have replaced the expired entry.
        if let Some(entry) = entries.get(key) {
            if entry.is_valid(now) {
                return Some(entry.value.clone());
            }
            entries.remove(key);
            debug!(key, "evicted expired cache entry");
            self.persist(&mut entries).await;
        }
        None
    }

    /// Store `value` for `ttl_secs` seconds (at least one) and refresh the
    /// key's stale shadow.
    pub async fn set(&self, key: &str, value: Value, ttl_secs: u64) {
        let now = self.clock.now_millis();
        let ttl_millis = ttl_secs.max(1).saturating_mul(1000);
        let entry = CacheEntry {
            value: value.clone(),
            created_at: now,
            expires_at: now.saturating_add(i64::try_from(ttl_millis).unwrap_or(i64::MAX)),
        };

        self.write_shadow(key, value).await;

        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), entry);
        self.persist(&mut entries).await;
    }

    async fn write_shadow(&self, key: &str, value: Value) {
        match serde_json::to_string(&value) {
            Ok(raw) => {
                if let Err(e) = self.store.set(&stale_key(key), &raw).await {
                    debug!(key, "ignoring stale shadow write failure: {}", e);
                }
            }
            Err(e) => debug!(key, "could not serialize stale shadow: {}", e),
        }
        self.shadows.write().await.insert(key.to_string(), value);
    }

    /// Last successfully stored value for `key`, regardless of expiry.
    pub async fn get_stale(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.shadows.read().await.get(key) {
            return Some(value.clone());
        }
        let raw = match self.store.get(&stale_key(key)).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, "error reading stale data: {}", e);
                return None;
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => {
                self.shadows
                    .write()
                    .await
                    .insert(key.to_string(), value.clone());
                Some(value)
            }
            Err(e) => {
                warn!(key, "error parsing stale data: {}", e);
                None
            }
        }
    }

    /// Remove every expired entry. Returns how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_valid(now));
        let removed = before - entries.len();
        if removed > 0 {
            info!(removed, "swept expired cache entries");
            self.persist(&mut entries).await;
        }
        removed
    }

    /// Keys that have a stale shadow, in the backend or in memory.
    pub async fn stale_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = match self.store.keys().await {
            Ok(keys) => keys
                .into_iter()
                .filter_map(|k| k.strip_prefix(STALE_PREFIX).map(str::to_string))
                .collect(),
            Err(e) => {
                warn!("could not list stored keys: {}", e);
                Vec::new()
            }
        };
        keys.extend(self.shadows.read().await.keys().cloned());
        keys.sort();
        keys.dedup();
        keys
    }

    /// Record that fresh data just arrived from a provider.
    pub async fn mark_updated(&self) {
        let stamp = self.clock.now().to_rfc3339();
        if let Err(e) = self.store.set(LAST_UPDATE_KEY, &stamp).await {
            debug!("could not record last data update: {}", e);
        }
    }

    pub async fn last_updated(&self) -> Option<String> {
        self.store.get(LAST_UPDATE_KEY).await.ok().flatten()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Write the primary map through to the backend. When the backend is
    /// full, evict the oldest entries and try once more; a second failure
    /// drops the write.
    async fn persist(&self, entries: &mut HashMap<String, CacheEntry>) {
        match self.write_entries(entries).await {
            Ok(()) => {}
            Err(StorageError::QuotaExceeded { needed, capacity }) => {
                warn!(
                    needed,
                    capacity,
                    evicting = self.evict_batch,
                    "storage full, evicting oldest cache entries"
                );
                evict_oldest(entries, self.evict_batch);
                if let Err(e) = self.write_entries(entries).await {
                    error!("still unable to save cache after clearing old items: {}", e);
                }
            }
            Err(e) => warn!("could not save cache to storage: {}", e),
        }
    }

    async fn write_entries(&self, entries: &HashMap<String, CacheEntry>) -> Result<(), StorageError> {
        let raw = serde_json::to_string(entries)?;
        self.store.set(CACHE_STORAGE_KEY, &raw).await
    }
}

fn stale_key(key: &str) -> String {
    format!("{}{}", STALE_PREFIX, key)
}

fn evict_oldest(entries: &mut HashMap<String, CacheEntry>, count: usize) {
    let mut by_age: Vec<(i64, String)> = entries
        .iter()
        .map(|(k, e)| (e.created_at, k.clone()))
        .collect();
    by_age.sort();
    for (_, key) in by_age.into_iter().take(count) {
        entries.remove(&key);
    }
}

/// Run [`PersistentCache::sweep_expired`] every `period`.
pub fn spawn_sweeper(cache: Arc<PersistentCache>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            cache.sweep_expired().await;
        }
    })
}
