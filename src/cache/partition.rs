//! One cached sheet: rows plus secondary indices.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::record::columns::{DEVICE_ID, EMAIL, STATUS, UID, USER_ID, USER_NAME};
use crate::record::{CellValue, CleanRecord, Record};
use crate::store::Row;

/// Identifies a partition: one sheet inside one store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionKey {
    pub store_id: String,
    pub sheet: String,
}

impl PartitionKey {
    pub fn new(store_id: &str, sheet: &str) -> Self {
        Self {
            store_id: store_id.to_string(),
            sheet: sheet.to_string(),
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.store_id, self.sheet)
    }
}

/// Identity columns that support direct lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityField {
    UserId,
    Uid,
    UserName,
    Email,
}

impl IdentityField {
    pub const ALL: [IdentityField; 4] = [
        IdentityField::UserId,
        IdentityField::Uid,
        IdentityField::UserName,
        IdentityField::Email,
    ];

    pub fn column(self) -> usize {
        match self {
            IdentityField::UserId => USER_ID,
            IdentityField::Uid => UID,
            IdentityField::UserName => USER_NAME,
            IdentityField::Email => EMAIL,
        }
    }

    fn for_column(column: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column() == column)
    }
}

/// Rows and indices of a partition. Only reachable through the
/// partition's lock.
#[derive(Debug, Default)]
pub struct PartitionData {
    raw: Vec<Record>,
    clean: Vec<CleanRecord>,
    by_owner: HashMap<String, usize>,
    by_status: HashMap<String, Vec<usize>>,
    unassigned: Vec<usize>,
    by_identity: HashMap<IdentityField, HashMap<String, usize>>,
}

impl PartitionData {
    /// Build rows and every index from store rows.
    pub fn build(rows: Vec<Row>) -> Self {
        let raw: Vec<Record> = rows.into_iter().map(Record::from_cells).collect();
        let clean: Vec<CleanRecord> = raw.iter().map(Record::clean).collect();

        let mut data = Self {
            raw,
            clean,
            ..Default::default()
        };

        for index in 0..data.raw.len() {
            let owner = data.clean[index].get(DEVICE_ID).to_string();
            if owner.is_empty() {
                data.unassigned.push(index);
            } else {
                data.by_owner.insert(owner, index);
            }

            let status = data.clean[index].get(STATUS).to_string();
            if !status.is_empty() {
                data.by_status.entry(status).or_default().push(index);
            }

            for field in IdentityField::ALL {
                let value = data.clean[index].get(field.column()).to_string();
                if !value.is_empty() {
                    data.by_identity.entry(field).or_default().insert(value, index);
                }
            }
        }

        data
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn record(&self, index: usize) -> Option<&Record> {
        self.raw.get(index)
    }

    pub fn clean(&self, index: usize) -> Option<&CleanRecord> {
        self.clean.get(index)
    }

    /// Clean owner key of a row (empty when unassigned or out of range).
    pub fn owner_of(&self, index: usize) -> &str {
        self.clean.get(index).map(|c| c.get(DEVICE_ID)).unwrap_or("")
    }

    /// Clean status of a row.
    pub fn status_of(&self, index: usize) -> &str {
        self.clean.get(index).map(|c| c.get(STATUS)).unwrap_or("")
    }

    /// Row owned by a clean owner key.
    pub fn find_owner(&self, owner_key: &str) -> Option<usize> {
        self.by_owner.get(owner_key).copied()
    }

    /// Rows holding a clean status, ascending.
    pub fn status_bucket(&self, status: &str) -> &[usize] {
        self.by_status.get(status).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rows with no owner, ascending.
    pub fn unassigned(&self) -> &[usize] {
        &self.unassigned
    }

    /// Row matching a clean identity value.
    pub fn find_identity(&self, field: IdentityField, value: &str) -> Option<usize> {
        self.by_identity
            .get(&field)
            .and_then(|m| m.get(value))
            .copied()
    }

    /// Rows (other than `except`) owned by `owner_key` whose status is in
    /// `statuses`.
    pub fn owned_rows_with_status(
        &self,
        owner_key: &str,
        statuses: &[&str],
        except: usize,
    ) -> Vec<usize> {
        self.clean
            .iter()
            .enumerate()
            .filter(|(i, c)| {
                *i != except && c.get(DEVICE_ID) == owner_key && statuses.contains(&c.get(STATUS))
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Set one cell, re-derive its clean value and keep the indices in step.
    ///
    /// Returns `false` when the row does not exist.
    pub fn set_cell(&mut self, index: usize, column: usize, value: CellValue) -> bool {
        let Some(record) = self.raw.get_mut(index) else {
            return false;
        };
        let before = self.clean[index].get(column).to_string();
        record.set(column, value);
        self.clean[index].refresh(column, record.get(column));
        let after = self.clean[index].get(column).to_string();

        if before != after {
            self.reindex(index, column, &before, &after);
        }
        true
    }

    /// Overwrite a whole row, reindexing every changed column.
    pub fn replace_record(&mut self, index: usize, record: Record) -> bool {
        if index >= self.raw.len() {
            return false;
        }
        for (column, value) in record.cells().iter().enumerate() {
            if self.raw[index].get(column) != value {
                self.set_cell(index, column, value.clone());
            }
        }
        true
    }

    /// Claim an unassigned row for `owner_key` (raw form).
    ///
    /// The owner is re-checked here, under the caller's write guard; a row
    /// that picked up an owner since the caller's read scan is left alone.
    pub fn claim(&mut self, index: usize, owner_key: &str) -> bool {
        if index >= self.raw.len() || !self.owner_of(index).is_empty() {
            return false;
        }
        self.set_cell(index, DEVICE_ID, CellValue::text(owner_key))
    }

    fn reindex(&mut self, index: usize, column: usize, before: &str, after: &str) {
        if column == DEVICE_ID {
            if !before.is_empty() && self.by_owner.get(before) == Some(&index) {
                self.by_owner.remove(before);
            }
            if after.is_empty() {
                insert_sorted(&mut self.unassigned, index);
            } else {
                remove_sorted(&mut self.unassigned, index);
                self.by_owner.insert(after.to_string(), index);
            }
        } else if column == STATUS {
            if let Some(bucket) = self.by_status.get_mut(before) {
                remove_sorted(bucket, index);
                if bucket.is_empty() {
                    self.by_status.remove(before);
                }
            }
            if !after.is_empty() {
                insert_sorted(self.by_status.entry(after.to_string()).or_default(), index);
            }
        } else if let Some(field) = IdentityField::for_column(column) {
            let map = self.by_identity.entry(field).or_default();
            if map.get(before) == Some(&index) {
                map.remove(before);
            }
            if !after.is_empty() {
                map.insert(after.to_string(), index);
            }
        }
    }
}

fn insert_sorted(list: &mut Vec<usize>, index: usize) {
    if let Err(pos) = list.binary_search(&index) {
        list.insert(pos, index);
    }
}

fn remove_sorted(list: &mut Vec<usize>, index: usize) {
    if let Ok(pos) = list.binary_search(&index) {
        list.remove(pos);
    }
}

/// A cached sheet with its own reader/writer lock.
#[derive(Debug)]
pub struct Partition {
    key: PartitionKey,
    data: RwLock<PartitionData>,
    loaded_at: Instant,
    ttl: Duration,
    data_start_row: usize,
}

impl Partition {
    pub fn new(key: PartitionKey, data: PartitionData, ttl: Duration, data_start_row: usize) -> Self {
        Self {
            key,
            data: RwLock::new(data),
            loaded_at: Instant::now(),
            ttl,
            data_start_row,
        }
    }

    pub fn key(&self) -> &PartitionKey {
        &self.key
    }

    pub fn loaded_at(&self) -> Instant {
        self.loaded_at
    }

    pub fn is_expired(&self) -> bool {
        self.loaded_at.elapsed() >= self.ttl
    }

    /// 1-based sheet row of a partition offset.
    pub fn row_number(&self, index: usize) -> usize {
        index + self.data_start_row
    }

    /// Partition offset of a 1-based sheet row; `None` above the data start.
    pub fn offset_of(&self, row_number: usize) -> Option<usize> {
        row_number.checked_sub(self.data_start_row)
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, PartitionData> {
        self.data.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, PartitionData> {
        self.data.write().await
    }
}
