//! Per-store debounced write-back buffer.

use std::collections::{BTreeMap, HashMap};
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::QueueConfig;
use crate::record::Record;
use crate::store::{BackingStore, Row};

/// Result of a flush
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlushReport {
    /// Rows sent in batch updates
    pub rows_written: usize,
    /// Rows sent as appends
    pub rows_appended: usize,
    /// Sheets whose remote call failed (their rows are dropped)
    pub failed_sheets: Vec<String>,
    /// True when another flush was already in flight and nothing was done
    pub skipped: bool,
}

impl FlushReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Default::default()
        }
    }

    pub(crate) fn absorb(&mut self, other: FlushReport) {
        self.rows_written += other.rows_written;
        self.rows_appended += other.rows_appended;
        self.failed_sheets.extend(other.failed_sheets);
    }
}

/// Snapshot of a queue's counters
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    pub store_id: String,
    pub pending_updates: usize,
    pub pending_appends: usize,
    pub flushing: bool,
    pub flushes: u64,
    pub rows_written: u64,
    pub rows_appended: u64,
    pub rows_coalesced: u64,
    pub failed_writes: u64,
}

#[derive(Default)]
struct PendingState {
    /// sheet -> row offset -> latest record
    updates: HashMap<String, BTreeMap<usize, Record>>,
    /// sheet -> rows in arrival order
    appends: HashMap<String, Vec<Record>>,
    flushing: bool,
    timer_armed: bool,
}

impl PendingState {
    fn has_pending(&self) -> bool {
        !self.updates.is_empty() || !self.appends.is_empty()
    }
}

/// Write-back queue for one store id.
pub struct WriteBackQueue {
    store_id: String,
    backing: Arc<dyn BackingStore>,
    config: QueueConfig,
    /// Guards only the pending maps and flags; never held across `.await`
    state: Mutex<PendingState>,
    flushes: AtomicU64,
    rows_written: AtomicU64,
    rows_appended: AtomicU64,
    rows_coalesced: AtomicU64,
    failed_writes: AtomicU64,
}

impl WriteBackQueue {
    pub fn new(store_id: &str, backing: Arc<dyn BackingStore>, config: QueueConfig) -> Self {
        Self {
            store_id: store_id.to_string(),
            backing,
            config,
            state: Mutex::new(PendingState::default()),
            flushes: AtomicU64::new(0),
            rows_written: AtomicU64::new(0),
            rows_appended: AtomicU64::new(0),
            rows_coalesced: AtomicU64::new(0),
            failed_writes: AtomicU64::new(0),
        }
    }

    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    /// Queue the latest state of a row. A later update to the same
    /// (sheet, row) before the next flush replaces this one.
    pub fn enqueue_update(self: &Arc<Self>, sheet: &str, row_index: usize, record: Record) {
        let arm = {
            let mut state = self.lock_state();
            let replaced = state
                .updates
                .entry(sheet.to_string())
                .or_default()
                .insert(row_index, record)
                .is_some();
            if replaced {
                self.rows_coalesced.fetch_add(1, Ordering::Relaxed);
            }
            Self::claim_timer(&mut state)
        };

        debug!(store_id = %self.store_id, sheet, row_index, "Row update queued");
        if arm {
            self.spawn_timer();
        }
    }

    /// Queue a new row to be appended to a sheet.
    pub fn enqueue_append(self: &Arc<Self>, sheet: &str, record: Record) {
        let arm = {
            let mut state = self.lock_state();
            state
                .appends
                .entry(sheet.to_string())
                .or_default()
                .push(record);
            Self::claim_timer(&mut state)
        };

        debug!(store_id = %self.store_id, sheet, "Row append queued");
        if arm {
            self.spawn_timer();
        }
    }

    /// Send pending writes to the backing store.
    ///
    /// Returns at once (with `skipped` set) if a flush is already running
    /// for this store. A non-forced flush re-arms the timer when new writes
    /// arrived while it was talking to the store.
    pub async fn flush(self: &Arc<Self>, forced: bool) -> FlushReport {
        let (updates, appends) = {
            let mut state = self.lock_state();
            if state.flushing {
                debug!(store_id = %self.store_id, "Flush already in flight");
                return FlushReport::skipped();
            }
            if !state.has_pending() {
                return FlushReport::default();
            }
            state.flushing = true;
            (mem::take(&mut state.updates), mem::take(&mut state.appends))
        };

        let start = Instant::now();
        let report = self.send(updates, appends).await;
        self.flushes.fetch_add(1, Ordering::Relaxed);

        let rearm = {
            let mut state = self.lock_state();
            state.flushing = false;
            if !forced && state.has_pending() {
                Self::claim_timer(&mut state)
            } else {
                false
            }
        };
        if rearm {
            self.spawn_timer();
        }

        info!(
            store_id = %self.store_id,
            forced,
            rows_written = report.rows_written,
            rows_appended = report.rows_appended,
            failed_sheets = report.failed_sheets.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Write-back flush completed"
        );
        report
    }

    /// Latest queued state of each pending row of a sheet, by row offset.
    pub fn pending_updates(&self, sheet: &str) -> Vec<(usize, Record)> {
        self.lock_state()
            .updates
            .get(sheet)
            .map(|rows| rows.iter().map(|(i, r)| (*i, r.clone())).collect())
            .unwrap_or_default()
    }

    /// Wait until no flush is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let flushing = self.lock_state().flushing;
            if !flushing {
                break;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }

    pub fn stats(&self) -> QueueStats {
        let state = self.lock_state();
        QueueStats {
            store_id: self.store_id.clone(),
            pending_updates: state.updates.values().map(BTreeMap::len).sum(),
            pending_appends: state.appends.values().map(Vec::len).sum(),
            flushing: state.flushing,
            flushes: self.flushes.load(Ordering::Relaxed),
            rows_written: self.rows_written.load(Ordering::Relaxed),
            rows_appended: self.rows_appended.load(Ordering::Relaxed),
            rows_coalesced: self.rows_coalesced.load(Ordering::Relaxed),
            failed_writes: self.failed_writes.load(Ordering::Relaxed),
        }
    }

    async fn send(
        &self,
        updates: HashMap<String, BTreeMap<usize, Record>>,
        appends: HashMap<String, Vec<Record>>,
    ) -> FlushReport {
        let mut report = FlushReport::default();

        for (sheet, rows) in updates {
            let rows: BTreeMap<usize, Row> = rows
                .into_iter()
                .map(|(index, record)| (index + self.config.data_start_row, record.cells().to_vec()))
                .collect();
            match self.backing.batch_update_rows(&self.store_id, &sheet, &rows).await {
                Ok(()) => {
                    report.rows_written += rows.len();
                    self.rows_written.fetch_add(rows.len() as u64, Ordering::Relaxed);
                }
                Err(e) => {
                    self.failed_writes.fetch_add(rows.len() as u64, Ordering::Relaxed);
                    warn!(
                        store_id = %self.store_id,
                        sheet = %sheet,
                        rows = rows.len(),
                        error = %e,
                        "Batch update failed, rows dropped"
                    );
                    report.failed_sheets.push(sheet);
                }
            }
        }

        for (sheet, records) in appends {
            let rows: Vec<Row> = records.iter().map(|r| r.cells().to_vec()).collect();
            match self.backing.append_rows(&self.store_id, &sheet, &rows).await {
                Ok(()) => {
                    report.rows_appended += rows.len();
                    self.rows_appended.fetch_add(rows.len() as u64, Ordering::Relaxed);
                }
                Err(e) => {
                    self.failed_writes.fetch_add(rows.len() as u64, Ordering::Relaxed);
                    warn!(
                        store_id = %self.store_id,
                        sheet = %sheet,
                        rows = rows.len(),
                        error = %e,
                        "Append failed, rows dropped"
                    );
                    report.failed_sheets.push(sheet);
                }
            }
        }

        report
    }

    /// Mark the timer armed; true if the caller must spawn it.
    fn claim_timer(state: &mut PendingState) -> bool {
        if state.timer_armed {
            false
        } else {
            state.timer_armed = true;
            true
        }
    }

    fn spawn_timer(self: &Arc<Self>) {
        let queue = Arc::clone(self);
        let delay = self.config.flush_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.lock_state().timer_armed = false;
            let report = queue.flush(false).await;
            if report.skipped {
                // The flush in flight may be forced and will not re-arm.
                let arm = {
                    let mut state = queue.lock_state();
                    state.has_pending() && Self::claim_timer(&mut state)
                };
                if arm {
                    queue.spawn_timer();
                }
            }
        });
    }

    fn lock_state(&self) -> MutexGuard<'_, PendingState> {
        // A poisoned lock only means a producer panicked mid-insert; the
        // maps themselves are still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::columns::STATUS;
    use crate::record::CellValue;
    use crate::store::MemoryStore;

    fn record(status: &str) -> Record {
        let mut record = Record::blank();
        record.set(STATUS, CellValue::text(status));
        record
    }

    fn queue(store: &Arc<MemoryStore>, delay: Duration) -> Arc<WriteBackQueue> {
        Arc::new(WriteBackQueue::new(
            "s1",
            store.clone(),
            QueueConfig {
                flush_delay: delay,
                data_start_row: 11,
            },
        ))
    }

    #[tokio::test]
    async fn test_updates_coalesce_per_row() {
        let store = Arc::new(MemoryStore::new());
        let q = queue(&store, Duration::from_secs(60));

        q.enqueue_update("Accounts", 2, record("Running"));
        q.enqueue_update("Accounts", 2, record("Waiting"));
        assert_eq!(q.stats().pending_updates, 1);
        assert_eq!(q.stats().rows_coalesced, 1);

        let report = q.flush(true).await;
        assert_eq!(report.rows_written, 1);
        assert_eq!(store.update_calls(), 1);

        let log = store.update_log().await;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].rows[&13][STATUS], CellValue::text("Waiting"));
    }

    #[tokio::test]
    async fn test_timer_flushes_after_delay() {
        let store = Arc::new(MemoryStore::new());
        let q = queue(&store, Duration::from_millis(20));

        q.enqueue_update("Accounts", 0, record("Running"));
        q.enqueue_update("Accounts", 1, record("Running"));
        assert_eq!(store.update_calls(), 0);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(store.update_calls(), 1);
        assert_eq!(q.stats().pending_updates, 0);
        assert_eq!(store.row("s1", "Accounts", 12).await.unwrap()[STATUS], CellValue::text("Running"));
    }

    #[tokio::test]
    async fn test_appends_keep_order() {
        let store = Arc::new(MemoryStore::new());
        let q = queue(&store, Duration::from_secs(60));

        q.enqueue_append("Accounts", record("first"));
        q.enqueue_append("Accounts", record("second"));
        let report = q.flush(true).await;

        assert_eq!(report.rows_appended, 2);
        assert_eq!(store.append_calls(), 1);
        assert_eq!(store.row("s1", "Accounts", 1).await.unwrap()[STATUS], CellValue::text("first"));
        assert_eq!(store.row("s1", "Accounts", 2).await.unwrap()[STATUS], CellValue::text("second"));
    }

    #[tokio::test]
    async fn test_single_flush_in_flight() {
        let store = Arc::new(MemoryStore::new());
        store.set_write_delay(Duration::from_millis(50));
        let q = queue(&store, Duration::from_secs(60));

        q.enqueue_update("Accounts", 0, record("Running"));
        let first = {
            let q = Arc::clone(&q);
            tokio::spawn(async move { q.flush(false).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        q.enqueue_update("Accounts", 1, record("Running"));
        let second = q.flush(false).await;
        assert!(second.skipped);

        let first = first.await.unwrap();
        assert_eq!(first.rows_written, 1);
        // The write made during the flush is still pending.
        assert_eq!(q.stats().pending_updates, 1);
    }

    #[tokio::test]
    async fn test_writes_during_flush_rearm_timer() {
        let store = Arc::new(MemoryStore::new());
        store.set_write_delay(Duration::from_millis(40));
        let q = queue(&store, Duration::from_millis(10));

        q.enqueue_update("Accounts", 0, record("Running"));
        // Timer fires at ~10ms and the flush holds the store for 40ms.
        tokio::time::sleep(Duration::from_millis(25)).await;
        q.enqueue_update("Accounts", 1, record("Waiting"));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(store.update_calls(), 2);
        assert_eq!(q.stats().pending_updates, 0);
    }

    #[tokio::test]
    async fn test_failed_write_is_dropped() {
        let store = Arc::new(MemoryStore::new());
        store.set_fail_writes(true);
        let q = queue(&store, Duration::from_secs(60));

        q.enqueue_update("Accounts", 0, record("Running"));
        let report = q.flush(true).await;
        assert_eq!(report.failed_sheets, vec!["Accounts".to_string()]);
        assert_eq!(q.stats().failed_writes, 1);

        store.set_fail_writes(false);
        let again = q.flush(true).await;
        assert_eq!(again.rows_written, 0);
        assert_eq!(store.update_calls(), 1);
    }

    #[tokio::test]
    async fn test_pending_updates_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let q = queue(&store, Duration::from_secs(60));

        q.enqueue_update("Accounts", 4, record("Running"));
        q.enqueue_update("Accounts", 4, record("Waiting"));
        q.enqueue_update("Other", 0, record("Login"));

        let pending = q.pending_updates("Accounts");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].0, 4);
        assert_eq!(pending[0].1.get(STATUS), &CellValue::text("Waiting"));
        assert!(q.pending_updates("Missing").is_empty());

        q.flush(true).await;
        assert!(q.pending_updates("Accounts").is_empty());
    }

    #[tokio::test]
    async fn test_flush_with_nothing_pending() {
        let store = Arc::new(MemoryStore::new());
        let q = queue(&store, Duration::from_secs(60));
        let report = q.flush(false).await;
        assert!(!report.skipped);
        assert_eq!(report.rows_written, 0);
        assert_eq!(store.update_calls(), 0);
    }
}
