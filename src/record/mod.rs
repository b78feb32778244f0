//! Account record model
//!
//! A record is one sheet row: exactly [`RECORD_WIDTH`] cells in sheet order.
//! It lives in two parallel forms:
//!
//! - **raw** ([`Record`]): the cell values exactly as the store returned them
//!   (text, numbers, booleans or empty)
//! - **clean** ([`CleanRecord`]): the leading [`CLEAN_COLUMN_LIMIT`] cells
//!   folded to canonical strings, used for every equality check
//!
//! Clean is derived from raw at load time and re-derived per cell whenever
//! the partition mutates a record.

pub mod columns;
pub mod note;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::normalize::fold;

pub use columns::{column_index, ColumnGroup, CLEAN_COLUMN_LIMIT, COLUMNS, RECORD_WIDTH};
pub use note::{Note, NoteMode};

/// A single cell value as held by the backing store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Build a text cell, mapping blank input to [`CellValue::Empty`].
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }

    /// Convert an arbitrary JSON value into a cell.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Empty,
            serde_json::Value::Bool(b) => CellValue::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or_default(),
            serde_json::Value::String(s) => CellValue::text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }

    /// JSON value for writing back to the store. Empty cells are sent as
    /// `""` so the store clears them instead of skipping them.
    pub fn to_wire(&self) -> serde_json::Value {
        match self {
            CellValue::Empty => serde_json::Value::String(String::new()),
            CellValue::Bool(b) => serde_json::Value::Bool(*b),
            CellValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(n.to_string())),
            CellValue::Text(s) => serde_json::Value::String(s.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(true) => write!(f, "TRUE"),
            CellValue::Bool(false) => write!(f, "FALSE"),
            // Whole numbers come back from the store as floats; print them
            // the way the sheet shows them.
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Raw account row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    cells: Vec<CellValue>,
}

impl Record {
    /// An all-empty row.
    pub fn blank() -> Self {
        Self {
            cells: vec![CellValue::Empty; RECORD_WIDTH],
        }
    }

    /// Build a record from store cells, padding or truncating to
    /// [`RECORD_WIDTH`].
    pub fn from_cells(mut cells: Vec<CellValue>) -> Self {
        cells.resize(RECORD_WIDTH, CellValue::Empty);
        Self { cells }
    }

    pub fn get(&self, column: usize) -> &CellValue {
        &self.cells[column]
    }

    /// Display text of a cell (raw, not folded).
    pub fn text(&self, column: usize) -> String {
        self.cells[column].to_string()
    }

    pub fn set(&mut self, column: usize, value: CellValue) {
        self.cells[column] = value;
    }

    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    /// Derive the clean form of this record.
    pub fn clean(&self) -> CleanRecord {
        CleanRecord {
            fields: self.cells[..CLEAN_COLUMN_LIMIT]
                .iter()
                .map(|c| fold(&c.to_string()))
                .collect(),
        }
    }

    /// Split the record into its three caller-facing maps.
    pub fn view(&self) -> RecordView {
        let group = |g: ColumnGroup| -> BTreeMap<String, String> {
            g.range()
                .map(|i| (COLUMNS[i].to_string(), self.text(i)))
                .collect()
        };
        RecordView {
            auth: group(ColumnGroup::Auth),
            activity: group(ColumnGroup::Activity),
            ai: group(ColumnGroup::Ai),
        }
    }
}

/// Folded comparison form of the leading record columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanRecord {
    fields: Vec<String>,
}

impl CleanRecord {
    /// Folded value of a column; columns past the clean limit read as empty.
    pub fn get(&self, column: usize) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }

    /// Re-derive one column from its raw value.
    pub fn refresh(&mut self, column: usize, raw: &CellValue) {
        if let Some(field) = self.fields.get_mut(column) {
            *field = fold(&raw.to_string());
        }
    }
}

/// Caller-facing record as three flat string maps.
#[derive(Debug, Clone, Serialize)]
pub struct RecordView {
    pub auth: BTreeMap<String, String>,
    pub activity: BTreeMap<String, String>,
    pub ai: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::columns::{DEVICE_ID, STATUS};

    #[test]
    fn test_from_cells_pads_and_truncates() {
        let short = Record::from_cells(vec![CellValue::text("Running")]);
        assert_eq!(short.cells().len(), RECORD_WIDTH);
        assert_eq!(short.get(1), &CellValue::Empty);

        let long = Record::from_cells(vec![CellValue::Number(1.0); RECORD_WIDTH + 5]);
        assert_eq!(long.cells().len(), RECORD_WIDTH);
    }

    #[test]
    fn test_clean_form_is_folded_and_bounded() {
        let mut record = Record::blank();
        record.set(STATUS, CellValue::text("  Đang Chạy "));
        record.set(DEVICE_ID, CellValue::text("DEV-1"));
        record.set(40, CellValue::text("Not Cleaned"));

        let clean = record.clean();
        assert_eq!(clean.get(STATUS), "dang chay");
        assert_eq!(clean.get(DEVICE_ID), "dev-1");
        assert_eq!(clean.get(40), "");
    }

    #[test]
    fn test_number_display() {
        assert_eq!(CellValue::Number(42.0).to_string(), "42");
        assert_eq!(CellValue::Number(1.5).to_string(), "1.5");
        assert_eq!(CellValue::Bool(true).to_string(), "TRUE");
    }

    #[test]
    fn test_cells_deserialize_heterogeneous() {
        let cells: Vec<CellValue> =
            serde_json::from_str(r#"["running", 12, true, null, ""]"#).unwrap();
        assert_eq!(cells[0], CellValue::Text("running".into()));
        assert_eq!(cells[1], CellValue::Number(12.0));
        assert_eq!(cells[2], CellValue::Bool(true));
        assert_eq!(cells[3], CellValue::Empty);
        assert!(cells[4].is_empty());
    }

    #[test]
    fn test_view_groups() {
        let mut record = Record::blank();
        record.set(DEVICE_ID, CellValue::text("dev1"));
        record.set(23, CellValue::Number(7.0));
        record.set(46, CellValue::text("friendly"));

        let view = record.view();
        assert_eq!(view.auth.len(), 23);
        assert_eq!(view.activity.len(), 23);
        assert_eq!(view.ai.len(), 15);
        assert_eq!(view.auth["device_id"], "dev1");
        assert_eq!(view.activity["posts_total"], "7");
        assert_eq!(view.ai["persona"], "friendly");
    }
}
