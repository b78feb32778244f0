//! Write-back queue
//!
//! Mutations made in the cache are persisted asynchronously. Each store id
//! has one [`WriteBackQueue`] that buffers row updates and appends, then
//! flushes them to the backing store once a debounce timer fires.
//!
//! ## Guarantees
//!
//! - Updates coalesce per (sheet, row): only the latest state is written
//! - Appends keep arrival order
//! - At most one flush is in flight per store id
//! - Producers never wait on the network: a flush swaps the pending buffer
//!   out under the mutex and calls the store after releasing it
//!
//! Failed remote writes are logged and dropped. At most one flush
//! interval's worth of mutations can be lost this way.

pub mod write_back;

pub use write_back::{FlushReport, QueueStats, WriteBackQueue};

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::info;

use crate::record::Record;
use crate::store::BackingStore;

/// Configuration for write-back queues
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Debounce delay between the first enqueue and the flush
    pub flush_delay: Duration,
    /// First sheet row holding account data; row offsets are relative to it
    pub data_start_row: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            flush_delay: Duration::from_secs(3),
            data_start_row: 11,
        }
    }
}

/// One write-back queue per store id
pub struct WriteBackRegistry {
    queues: DashMap<String, Arc<WriteBackQueue>>,
    backing: Arc<dyn BackingStore>,
    config: QueueConfig,
}

impl WriteBackRegistry {
    pub fn new(backing: Arc<dyn BackingStore>, config: QueueConfig) -> Self {
        info!(
            flush_delay_ms = config.flush_delay.as_millis() as u64,
            "Write-back registry initialized"
        );
        Self {
            queues: DashMap::new(),
            backing,
            config,
        }
    }

    /// Queue for a store id, created on first use.
    pub fn queue(&self, store_id: &str) -> Arc<WriteBackQueue> {
        if let Some(queue) = self.queues.get(store_id) {
            return Arc::clone(queue.value());
        }
        let entry = self.queues.entry(store_id.to_string()).or_insert_with(|| {
            Arc::new(WriteBackQueue::new(
                store_id,
                Arc::clone(&self.backing),
                self.config.clone(),
            ))
        });
        Arc::clone(entry.value())
    }

    /// Force a flush of one store's queue, if it has one. An in-flight flush
    /// is waited out first so nothing pending is left behind.
    pub async fn flush_store(&self, store_id: &str) -> Option<FlushReport> {
        let queue = self.queues.get(store_id).map(|q| Arc::clone(q.value()))?;
        queue.wait_idle().await;
        Some(queue.flush(true).await)
    }

    /// Flush everything for shutdown: wait out in-flight flushes, then force
    /// a final flush of every queue.
    pub async fn shutdown(&self) -> FlushReport {
        let queues: Vec<Arc<WriteBackQueue>> =
            self.queues.iter().map(|q| Arc::clone(q.value())).collect();

        let reports = futures::future::join_all(queues.into_iter().map(|queue| async move {
            queue.wait_idle().await;
            queue.flush(true).await
        }))
        .await;

        let mut total = FlushReport::default();
        for report in reports {
            total.absorb(report);
        }

        info!(
            rows_written = total.rows_written,
            rows_appended = total.rows_appended,
            failed_sheets = total.failed_sheets.len(),
            "Write-back queues drained"
        );
        total
    }

    /// Pending row updates of one sheet; empty when the store has no queue.
    pub fn pending_updates(&self, store_id: &str, sheet: &str) -> Vec<(usize, Record)> {
        self.queues
            .get(store_id)
            .map(|q| q.value().pending_updates(sheet))
            .unwrap_or_default()
    }

    /// Per-store statistics.
    pub fn stats(&self) -> Vec<QueueStats> {
        self.queues.iter().map(|q| q.value().stats()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_registry_reuses_queue_per_store() {
        let store = Arc::new(MemoryStore::new());
        let registry = WriteBackRegistry::new(store, QueueConfig::default());

        let a = registry.queue("s1");
        let b = registry.queue("s1");
        let c = registry.queue("s2");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(registry.stats().len(), 2);
    }

    #[tokio::test]
    async fn test_shutdown_flushes_all_queues() {
        let store = Arc::new(MemoryStore::new());
        let registry = WriteBackRegistry::new(
            store.clone(),
            QueueConfig {
                flush_delay: Duration::from_secs(60),
                data_start_row: 11,
            },
        );

        registry.queue("s1").enqueue_update("Accounts", 0, Record::blank());
        registry.queue("s2").enqueue_append("Accounts", Record::blank());

        let report = registry.shutdown().await;
        assert_eq!(report.rows_written, 1);
        assert_eq!(report.rows_appended, 1);
        assert_eq!(store.update_calls(), 1);
        assert_eq!(store.append_calls(), 1);
    }

    #[tokio::test]
    async fn test_flush_store_without_queue() {
        let store = Arc::new(MemoryStore::new());
        let registry = WriteBackRegistry::new(store, QueueConfig::default());
        assert!(registry.flush_store("unknown").await.is_none());
    }
}
