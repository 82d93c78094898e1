//! Tab layouts for the content queue and the run ledger.

use crate::error::SheetError;
use crate::store::{Row, column_index};

/// A tab name with its header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabSchema {
    pub name: &'static str,
    pub headers: &'static [&'static str],
}

impl TabSchema {
    /// 0-based column of `header` in this layout.
    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| *h == header)
    }
}

pub const QUEUE: TabSchema = TabSchema {
    name: "CHECKLIST_QUEUE",
    headers: &["Date", "IdemKey", "DraftPath", "Status", "Notes"],
};

pub const RUN_LEDGER: TabSchema = TabSchema {
    name: "PIPELINE_RUNS",
    headers: &[
        "Date",
        "IdemKey",
        "RunId",
        "Draft",
        "FinalStatus",
        "Attempts",
        "FailedGates",
    ],
};

pub const STATUS_READY: &str = "READY";
pub const STATUS_DONE: &str = "DONE";
pub const STATUS_FAIL: &str = "FAIL";

/// One data row of a queue tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    /// 1-based, header included, as used by `update_cell`.
    pub row_number: usize,
    pub date: String,
    pub idem_key: String,
    pub draft_path: String,
    pub status: String,
    pub notes: String,
}

/// 1-based columns of the queue fields in an actual header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueColumns {
    pub date: usize,
    pub idem_key: usize,
    pub draft_path: usize,
    pub status: usize,
    pub notes: usize,
}

impl QueueColumns {
    /// Locate the queue columns by header name, so reordered tabs still
    /// work.
    pub fn locate(tab: &str, header: &[String]) -> Result<Self, SheetError> {
        let find = |name: &str| {
            column_index(header, name)
                .map(|idx| idx + 1)
                .ok_or_else(|| SheetError::MissingColumn {
                    tab: tab.to_string(),
                    column: name.to_string(),
                })
        };
        Ok(Self {
            date: find("Date")?,
            idem_key: find("IdemKey")?,
            draft_path: find("DraftPath")?,
            status: find("Status")?,
            notes: find("Notes")?,
        })
    }
}

/// Parse every data row of a queue tab. Returns the located columns too.
pub fn queue_entries(
    tab: &str,
    rows: &[Row],
) -> Result<(QueueColumns, Vec<QueueEntry>), SheetError> {
    let Some((header, data)) = rows.split_first() else {
        return Err(SheetError::TabNotFound(tab.to_string()));
    };
    let columns = QueueColumns::locate(tab, header)?;
    let cell = |row: &Row, col: usize| {
        row.get(col - 1)
            .map(|c| c.trim().to_string())
            .unwrap_or_default()
    };
    let entries = data
        .iter()
        .enumerate()
        .map(|(idx, row)| QueueEntry {
            row_number: idx + 2,
            date: cell(row, columns.date),
            idem_key: cell(row, columns.idem_key),
            draft_path: cell(row, columns.draft_path),
            status: cell(row, columns.status),
            notes: cell(row, columns.notes),
        })
        .collect();
    Ok((columns, entries))
}
