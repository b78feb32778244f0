//! Backing store access
//!
//! The backing store is a remote, rate-limited tabular service addressed by
//! store id + sheet name + row range. Everything else in Gatehouse talks to
//! it through [`BackingStore`] so the cache and write-back queue can be
//! exercised against [`MemoryStore`] in tests and dev mode.
//!
//! Row numbers at this boundary are 1-based sheet rows; converting from
//! partition offsets is the caller's job.

pub mod memory;
pub mod sheets;

use std::collections::BTreeMap;

use crate::record::CellValue;
use crate::types::Result;

pub use memory::MemoryStore;
pub use sheets::{SheetsStore, SheetsStoreConfig};

/// One row of cells as exchanged with the store.
pub type Row = Vec<CellValue>;

/// Trait for the remote tabular store (allows mocking in tests)
#[async_trait::async_trait]
pub trait BackingStore: Send + Sync {
    /// Fetch rows `start_row..=end_row`. Trailing empty rows may be omitted.
    async fn fetch_rows(
        &self,
        store_id: &str,
        sheet: &str,
        start_row: usize,
        end_row: usize,
    ) -> Result<Vec<Row>>;

    /// Overwrite whole rows, keyed by sheet row number.
    async fn batch_update_rows(
        &self,
        store_id: &str,
        sheet: &str,
        rows: &BTreeMap<usize, Row>,
    ) -> Result<()>;

    /// Append rows after the last used row of the sheet.
    async fn append_rows(&self, store_id: &str, sheet: &str, rows: &[Row]) -> Result<()>;
}
