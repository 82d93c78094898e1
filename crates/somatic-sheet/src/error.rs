//! Row-store errors.

/// Errors from row-store operations.
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("{path}: I/O error: {message}")]
    Io { path: String, message: String },

    #[error("{path}: parse error: {message}")]
    Parse { path: String, message: String },

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("corrupted store: {0}")]
    Corrupt(String),

    #[error("store lock busy: {lock_path}")]
    LockBusy { lock_path: String },

    #[error("tab not found: {0}")]
    TabNotFound(String),

    /// Row and column numbers are 1-based, as in a spreadsheet.
    #[error("{tab}: cell ({row}, {col}) is out of range")]
    CellOutOfRange { tab: String, row: usize, col: usize },

    #[error("{tab}: header has no column {column}")]
    MissingColumn { tab: String, column: String },

    #[error("{tab}: row has no key in column {col}")]
    MissingKey { tab: String, col: usize },
}

impl SheetError {
    pub(crate) fn io(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
