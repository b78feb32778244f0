//! In-memory backing store
//!
//! Used in dev mode and by tests. Counts every call so tests can assert how
//! often the cache and queue actually reach the store, and can be told to
//! fail fetches or writes.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;

use super::{BackingStore, Row};
use crate::types::{GatehouseError, Result};

type SheetKey = (String, String);

/// A recorded `batch_update_rows` call.
#[derive(Debug, Clone)]
pub struct UpdateCall {
    pub store_id: String,
    pub sheet: String,
    pub rows: BTreeMap<usize, Row>,
}

/// Simple in-memory tabular store
#[derive(Default)]
pub struct MemoryStore {
    sheets: RwLock<HashMap<SheetKey, BTreeMap<usize, Row>>>,
    update_log: RwLock<Vec<UpdateCall>>,
    fetch_calls: AtomicU64,
    update_calls: AtomicU64,
    append_calls: AtomicU64,
    fail_fetch: AtomicBool,
    fail_writes: AtomicBool,
    fetch_delay_ms: AtomicU64,
    write_delay_ms: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `rows` at consecutive sheet rows starting at `start_row`.
    pub async fn seed(&self, store_id: &str, sheet: &str, start_row: usize, rows: Vec<Row>) {
        let mut sheets = self.sheets.write().await;
        let table = sheets
            .entry((store_id.to_string(), sheet.to_string()))
            .or_default();
        for (offset, row) in rows.into_iter().enumerate() {
            table.insert(start_row + offset, row);
        }
    }

    /// Current content of one sheet row.
    pub async fn row(&self, store_id: &str, sheet: &str, row_number: usize) -> Option<Row> {
        let sheets = self.sheets.read().await;
        sheets
            .get(&(store_id.to_string(), sheet.to_string()))
            .and_then(|t| t.get(&row_number).cloned())
    }

    /// Number of used rows in a sheet.
    pub async fn row_count(&self, store_id: &str, sheet: &str) -> usize {
        let sheets = self.sheets.read().await;
        sheets
            .get(&(store_id.to_string(), sheet.to_string()))
            .map(|t| t.len())
            .unwrap_or(0)
    }

    pub async fn update_log(&self) -> Vec<UpdateCall> {
        self.update_log.read().await.clone()
    }

    pub fn fetch_calls(&self) -> u64 {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> u64 {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn append_calls(&self) -> u64 {
        self.append_calls.load(Ordering::SeqCst)
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every fetch sleep first (to exercise timeouts).
    pub fn set_fetch_delay(&self, delay: Duration) {
        self.fetch_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Make every write sleep first (to hold a flush in flight).
    pub fn set_write_delay(&self, delay: Duration) {
        self.write_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    async fn write_delay(&self) {
        let delay = self.write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }
}

#[async_trait::async_trait]
impl BackingStore for MemoryStore {
    async fn fetch_rows(
        &self,
        store_id: &str,
        sheet: &str,
        start_row: usize,
        end_row: usize,
    ) -> Result<Vec<Row>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.fetch_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(GatehouseError::RemoteFetch("memory store: fetch disabled".into()));
        }

        let sheets = self.sheets.read().await;
        let Some(table) = sheets.get(&(store_id.to_string(), sheet.to_string())) else {
            return Ok(Vec::new());
        };

        let last = table
            .range(start_row..=end_row)
            .next_back()
            .map(|(n, _)| *n);
        let Some(last) = last else {
            return Ok(Vec::new());
        };

        Ok((start_row..=last)
            .map(|n| table.get(&n).cloned().unwrap_or_default())
            .collect())
    }

    async fn batch_update_rows(
        &self,
        store_id: &str,
        sheet: &str,
        rows: &BTreeMap<usize, Row>,
    ) -> Result<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.write_delay().await;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(GatehouseError::RemoteWrite("memory store: writes disabled".into()));
        }

        {
            let mut sheets = self.sheets.write().await;
            let table = sheets
                .entry((store_id.to_string(), sheet.to_string()))
                .or_default();
            for (n, row) in rows {
                table.insert(*n, row.clone());
            }
        }

        self.update_log.write().await.push(UpdateCall {
            store_id: store_id.to_string(),
            sheet: sheet.to_string(),
            rows: rows.clone(),
        });
        Ok(())
    }

    async fn append_rows(&self, store_id: &str, sheet: &str, rows: &[Row]) -> Result<()> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        self.write_delay().await;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(GatehouseError::RemoteWrite("memory store: writes disabled".into()));
        }

        let mut sheets = self.sheets.write().await;
        let table = sheets
            .entry((store_id.to_string(), sheet.to_string()))
            .or_default();
        let mut next = table.keys().next_back().map(|n| n + 1).unwrap_or(1);
        for row in rows {
            table.insert(next, row.clone());
            next += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CellValue;

    fn row(text: &str) -> Row {
        vec![CellValue::text(text)]
    }

    #[tokio::test]
    async fn test_fetch_range_fills_gaps() {
        let store = MemoryStore::new();
        store.seed("s", "Accounts", 11, vec![row("a")]).await;
        store.seed("s", "Accounts", 13, vec![row("c")]).await;

        let rows = store.fetch_rows("s", "Accounts", 11, 100).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[1].is_empty());
        assert_eq!(store.fetch_calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_unknown_sheet_is_empty() {
        let store = MemoryStore::new();
        let rows = store.fetch_rows("s", "Missing", 1, 10).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_append_after_last_row() {
        let store = MemoryStore::new();
        store.seed("s", "Accounts", 11, vec![row("a"), row("b")]).await;
        store.append_rows("s", "Accounts", &[row("c")]).await.unwrap();

        assert_eq!(store.row("s", "Accounts", 13).await, Some(row("c")));
        assert_eq!(store.append_calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryStore::new();
        store.set_fail_fetch(true);
        assert!(matches!(
            store.fetch_rows("s", "Accounts", 1, 2).await,
            Err(GatehouseError::RemoteFetch(_))
        ));

        store.set_fail_writes(true);
        let rows = BTreeMap::from([(1, row("x"))]);
        assert!(matches!(
            store.batch_update_rows("s", "Accounts", &rows).await,
            Err(GatehouseError::RemoteWrite(_))
        ));
    }
}
