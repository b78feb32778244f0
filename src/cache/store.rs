//! Partition registry
//!
//! Maps (store id, sheet) to the live [`Partition`] and reloads it from the
//! backing store when it is missing, expired or a reload is forced.
//!
//! When attached to the write-back registry, a reload first drains the
//! store's queue so claims made in the cache reach the store before it is
//! read back, and writes queued while the fetch ran are laid over the
//! fetched rows.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::partition::{Partition, PartitionData, PartitionKey};
use super::CacheConfig;
use crate::queue::WriteBackRegistry;
use crate::store::BackingStore;
use crate::types::{GatehouseError, Result};

/// Cache statistics
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CacheStats {
    pub partitions: usize,
    pub hits: u64,
    pub misses: u64,
    pub loads: u64,
    pub load_failures: u64,
}

impl CacheStats {
    /// Calculate hit rate as percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Registry of cached partitions
pub struct PartitionCache {
    partitions: DashMap<PartitionKey, Arc<Partition>>,
    /// Serializes loads per key so an expired partition is fetched once
    load_locks: DashMap<PartitionKey, Arc<Mutex<()>>>,
    store: Arc<dyn BackingStore>,
    /// Pending cache mutations that a reload must not discard
    write_back: Option<Arc<WriteBackRegistry>>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    load_failures: AtomicU64,
}

impl PartitionCache {
    pub fn new(store: Arc<dyn BackingStore>, config: CacheConfig) -> Self {
        Self {
            partitions: DashMap::new(),
            load_locks: DashMap::new(),
            store,
            write_back: None,
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            loads: AtomicU64::new(0),
            load_failures: AtomicU64::new(0),
        }
    }

    /// Flush and consult `write_back` around every reload.
    pub fn with_write_back(mut self, write_back: Arc<WriteBackRegistry>) -> Self {
        self.write_back = Some(write_back);
        self
    }

    /// Get a fresh partition, loading it from the backing store if needed.
    ///
    /// A live partition is returned without I/O unless `force_reload` is set.
    /// Load failures are returned as [`GatehouseError::RemoteFetch`]; a stale
    /// partition is never served in their place.
    pub async fn get(&self, store_id: &str, sheet: &str, force_reload: bool) -> Result<Arc<Partition>> {
        let key = PartitionKey::new(store_id, sheet);
        let requested_at = Instant::now();

        if !force_reload {
            if let Some(partition) = self.live(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(partition);
            }
        }

        let lock = Arc::clone(&self.load_locks.entry(key.clone()).or_default());
        let _guard = lock.lock().await;

        // Someone else may have finished a load while we waited.
        if let Some(partition) = self.current(&key) {
            let fresh_enough = !force_reload || partition.loaded_at() >= requested_at;
            if fresh_enough && !partition.is_expired() {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(partition);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let partition = Arc::new(self.load(&key).await?);
        self.partitions.insert(key, Arc::clone(&partition));
        Ok(partition)
    }

    /// Drop every partition of a store. Returns how many were dropped.
    pub fn clear_store(&self, store_id: &str) -> usize {
        let before = self.partitions.len();
        self.partitions.retain(|k, _| k.store_id != store_id);
        self.load_locks.retain(|k, _| k.store_id != store_id);
        let dropped = before.saturating_sub(self.partitions.len());
        info!(store_id, dropped, "Partitions cleared");
        dropped
    }

    /// Remove expired partitions
    pub fn cleanup(&self) -> usize {
        let before = self.partitions.len();
        self.partitions.retain(|_, p| !p.is_expired());
        let removed = before.saturating_sub(self.partitions.len());
        if removed > 0 {
            debug!(count = removed, "Dropped expired partitions");
        }
        removed
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            partitions: self.partitions.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn current(&self, key: &PartitionKey) -> Option<Arc<Partition>> {
        self.partitions.get(key).map(|p| Arc::clone(p.value()))
    }

    fn live(&self, key: &PartitionKey) -> Option<Arc<Partition>> {
        self.current(key).filter(|p| !p.is_expired())
    }

    async fn load(&self, key: &PartitionKey) -> Result<Partition> {
        let start = Instant::now();
        self.loads.fetch_add(1, Ordering::Relaxed);

        if let Some(write_back) = &self.write_back {
            if let Some(report) = write_back.flush_store(&key.store_id).await {
                if !report.failed_sheets.is_empty() {
                    warn!(partition = %key, failed_sheets = ?report.failed_sheets, "Reloading after failed write-back");
                }
            }
        }

        let fetch = self.store.fetch_rows(
            &key.store_id,
            &key.sheet,
            self.config.data_start_row,
            self.config.data_end_row,
        );

        let rows = match tokio::time::timeout(self.config.fetch_timeout, fetch).await {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => {
                self.load_failures.fetch_add(1, Ordering::Relaxed);
                warn!(partition = %key, error = %e, "Partition load failed");
                return Err(match e {
                    GatehouseError::RemoteFetch(_) => e,
                    other => GatehouseError::RemoteFetch(other.to_string()),
                });
            }
            Err(_) => {
                self.load_failures.fetch_add(1, Ordering::Relaxed);
                warn!(
                    partition = %key,
                    timeout_ms = self.config.fetch_timeout.as_millis() as u64,
                    "Partition load timed out"
                );
                return Err(GatehouseError::RemoteFetch(format!(
                    "fetch of {} timed out after {:?}",
                    key, self.config.fetch_timeout
                )));
            }
        };

        let mut data = PartitionData::build(rows);
        let replayed = match &self.write_back {
            Some(write_back) => write_back
                .pending_updates(&key.store_id, &key.sheet)
                .into_iter()
                .filter(|(index, record)| data.replace_record(*index, record.clone()))
                .count(),
            None => 0,
        };
        info!(
            partition = %key,
            rows = data.len(),
            replayed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Partition loaded"
        );

        Ok(Partition::new(
            key.clone(),
            data,
            self.config.ttl,
            self.config.data_start_row,
        ))
    }
}

/// Spawn a background task to periodically drop expired partitions
pub fn spawn_cleanup_task(cache: Arc<PartitionCache>) {
    let interval = cache.config.cleanup_interval;

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let removed = cache.cleanup();
            let stats = cache.stats();
            debug!(
                removed = removed,
                partitions = stats.partitions,
                hit_rate = format!("{:.1}%", stats.hit_rate()),
                "Cache cleanup completed"
            );
        }
    });

    info!("Cache cleanup task started");
}
