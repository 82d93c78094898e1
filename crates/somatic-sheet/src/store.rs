//! The row-store capability and its in-memory implementation.
//!
//! A store is a set of named tabs, each a list of rows of string cells. The
//! first row of a tab is its header. Cell coordinates are 1-based, counting
//! the header as row 1.

use crate::error::SheetError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

pub type Row = Vec<String>;

/// All tabs of a store, keyed by tab name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tabs(pub BTreeMap<String, Vec<Row>>);

impl Tabs {
    pub fn rows(&self, tab: &str) -> Result<&[Row], SheetError> {
        self.0
            .get(tab)
            .map(Vec::as_slice)
            .ok_or_else(|| SheetError::TabNotFound(tab.to_string()))
    }

    /// Create `tab` with `headers` unless it already has rows. Returns
    /// whether anything changed.
    pub fn ensure_tab(&mut self, tab: &str, headers: &[&str]) -> bool {
        let rows = self.0.entry(tab.to_string()).or_default();
        if rows.is_empty() {
            rows.push(headers.iter().map(|h| h.to_string()).collect());
            return true;
        }
        false
    }

    pub fn append_row(&mut self, tab: &str, row: Row) -> Result<usize, SheetError> {
        let rows = self
            .0
            .get_mut(tab)
            .ok_or_else(|| SheetError::TabNotFound(tab.to_string()))?;
        rows.push(row);
        Ok(rows.len())
    }

    /// Set one cell, padding the row with empty cells as needed.
    pub fn update_cell(
        &mut self,
        tab: &str,
        row: usize,
        col: usize,
        value: &str,
    ) -> Result<(), SheetError> {
        let rows = self
            .0
            .get_mut(tab)
            .ok_or_else(|| SheetError::TabNotFound(tab.to_string()))?;
        let out_of_range = || SheetError::CellOutOfRange {
            tab: tab.to_string(),
            row,
            col,
        };
        if col == 0 {
            return Err(out_of_range());
        }
        let cells = row
            .checked_sub(1)
            .and_then(|idx| rows.get_mut(idx))
            .ok_or_else(out_of_range)?;
        if cells.len() < col {
            cells.resize(col, String::new());
        }
        cells[col - 1] = value.to_string();
        Ok(())
    }
}

/// Read, append and update rows in named tabs.
pub trait RowStore: Send + Sync {
    /// Every row of `tab`, header first.
    fn read_rows(&self, tab: &str) -> Result<Vec<Row>, SheetError>;

    /// Append `row` and return its 1-based row number.
    fn append_row(&self, tab: &str, row: Row) -> Result<usize, SheetError>;

    /// Overwrite one cell (1-based coordinates).
    fn update_cell(&self, tab: &str, row: usize, col: usize, value: &str)
    -> Result<(), SheetError>;

    /// Create `tab` with a header row if it is missing or empty.
    fn ensure_tab(&self, tab: &str, headers: &[&str]) -> Result<(), SheetError>;
}

/// Process-local store, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryRowStore {
    tabs: Mutex<Tabs>,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tabs(tabs: Tabs) -> Self {
        Self {
            tabs: Mutex::new(tabs),
        }
    }

    pub fn snapshot(&self) -> Tabs {
        self.with(|tabs| tabs.clone())
    }

    fn with<T>(&self, f: impl FnOnce(&mut Tabs) -> T) -> T {
        let mut guard = self.tabs.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl RowStore for MemoryRowStore {
    fn read_rows(&self, tab: &str) -> Result<Vec<Row>, SheetError> {
        self.with(|tabs| tabs.rows(tab).map(<[Row]>::to_vec))
    }

    fn append_row(&self, tab: &str, row: Row) -> Result<usize, SheetError> {
        self.with(|tabs| tabs.append_row(tab, row))
    }

    fn update_cell(
        &self,
        tab: &str,
        row: usize,
        col: usize,
        value: &str,
    ) -> Result<(), SheetError> {
        self.with(|tabs| tabs.update_cell(tab, row, col, value))
    }

    fn ensure_tab(&self, tab: &str, headers: &[&str]) -> Result<(), SheetError> {
        self.with(|tabs| {
            tabs.ensure_tab(tab, headers);
        });
        Ok(())
    }
}

/// 0-based index of `name` in a header row.
pub fn column_index(header: &[String], name: &str) -> Option<usize> {
    header.iter().position(|h| h.trim() == name)
}
