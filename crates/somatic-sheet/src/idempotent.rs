//! Idempotent appends keyed by content hash.

use crate::error::SheetError;
use crate::store::{Row, RowStore};
use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};

/// Hex characters kept from the SHA-256 digest.
pub const KEY_LEN: usize = 12;

/// Recent rows scanned for a duplicate key when no window is given.
pub const DEFAULT_WINDOW: usize = 200;

/// `title` and `body` hashed as `"{title}\n{body}"`, first [`KEY_LEN`] hex
/// characters.
pub fn content_key(title: &str, body: &str) -> String {
    let digest = Sha256::digest(format!("{title}\n{body}").as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..KEY_LEN].to_string()
}

/// UTC timestamp for a row's date column.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Appended at this 1-based row number.
    Appended(usize),
    /// A row with the same key sits at this row number inside the window.
    Duplicate(usize),
}

/// Append `row` unless one of the last `window` data rows already carries
/// its key in column `key_col` (0-based). A `window` of 0 scans every row.
///
/// The check and the append are separate store calls, so two writers racing
/// on the same key can both append.
pub fn append_idempotent(
    store: &dyn RowStore,
    tab: &str,
    row: Row,
    key_col: usize,
    window: usize,
) -> Result<AppendOutcome, SheetError> {
    let key = row
        .get(key_col)
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .ok_or_else(|| SheetError::MissingKey {
            tab: tab.to_string(),
            col: key_col,
        })?
        .to_string();

    let rows = store.read_rows(tab)?;
    let first_data = 1.min(rows.len());
    let start = if window == 0 {
        first_data
    } else {
        rows.len().saturating_sub(window).max(first_data)
    };
    let existing = rows[start..]
        .iter()
        .rposition(|r| r.get(key_col).is_some_and(|cell| cell.trim() == key));
    if let Some(offset) = existing {
        let row_number = start + offset + 1;
        tracing::info!(tab, key = %key, row = row_number, "duplicate row skipped");
        return Ok(AppendOutcome::Duplicate(row_number));
    }

    let row_number = store.append_row(tab, row)?;
    tracing::debug!(tab, key = %key, row = row_number, "row appended");
    Ok(AppendOutcome::Appended(row_number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRowStore;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn store_with(keys: &[&str]) -> MemoryRowStore {
        let store = MemoryRowStore::new();
        store.ensure_tab("LOG", &["Date", "IdemKey"]).expect("ensure");
        for key in keys {
            store.append_row("LOG", row(&["d", key])).expect("append");
        }
        store
    }

    #[test]
    fn content_key_is_twelve_hex_chars() {
        let key = content_key("허리 리셋", "본문");
        assert_eq!(key.len(), KEY_LEN);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, content_key("허리 리셋", "본문"));
        assert_ne!(key, content_key("허리 리셋", "본문 "));
        // sha256("\n")
        assert_eq!(content_key("", ""), "01ba4719c80b");
    }

    #[test]
    fn duplicate_inside_the_window_is_skipped() {
        let store = store_with(&["a", "b", "c"]);
        let outcome = append_idempotent(&store, "LOG", row(&["d", "b"]), 1, 2).expect("append");
        assert_eq!(outcome, AppendOutcome::Duplicate(3));
        assert_eq!(store.read_rows("LOG").expect("rows").len(), 4);
    }

    #[test]
    fn duplicate_outside_the_window_is_appended() {
        let store = store_with(&["a", "b", "c"]);
        let outcome = append_idempotent(&store, "LOG", row(&["d", "a"]), 1, 2).expect("append");
        assert_eq!(outcome, AppendOutcome::Appended(5));
    }

    #[test]
    fn zero_window_scans_everything_but_the_header() {
        let store = store_with(&["a", "b"]);
        assert_eq!(
            append_idempotent(&store, "LOG", row(&["d", "a"]), 1, 0).expect("append"),
            AppendOutcome::Duplicate(2)
        );
        assert_eq!(
            append_idempotent(&store, "LOG", row(&["d", "IdemKey"]), 1, 0).expect("append"),
            AppendOutcome::Appended(4)
        );
    }

    #[test]
    fn row_without_a_key_is_rejected() {
        let store = store_with(&[]);
        assert!(matches!(
            append_idempotent(&store, "LOG", row(&["d", "  "]), 1, 10),
            Err(SheetError::MissingKey { col: 1, .. })
        ));
        assert!(matches!(
            append_idempotent(&store, "LOG", row(&["d"]), 1, 10),
            Err(SheetError::MissingKey { .. })
        ));
    }
}
