//! JSON-file row store.
//!
//! The file holds one JSON object mapping tab names to rows. Every mutation
//! takes a `<path>.lock` file, reloads, applies the change and replaces the
//! file through a synced temp file and a rename. A missing file reads as an
//! empty store.

use crate::error::SheetError;
use crate::store::{Row, RowStore, Tabs};
use chrono::Utc;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> PathBuf {
        lock_path(&self.path)
    }

    /// Current contents; empty when the file does not exist yet.
    pub fn load(&self) -> Result<Tabs, SheetError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Tabs::default()),
            Err(err) => return Err(SheetError::io(&self.path, err)),
        };
        let text = validate_bytes(&self.path, &bytes)?;
        if text.trim().is_empty() {
            return Ok(Tabs::default());
        }
        serde_json::from_str(text).map_err(|e| SheetError::Parse {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Run one lock-scoped mutation. The mutator returns `(value, changed)`;
    /// the file is rewritten only when `changed` is true.
    pub fn mutate<T>(
        &self,
        mutator: impl FnOnce(&mut Tabs) -> Result<(T, bool), SheetError>,
    ) -> Result<T, SheetError> {
        let _guard = StoreLockGuard::acquire(&self.path)?;
        let mut tabs = self.load()?;
        let (value, changed) = mutator(&mut tabs)?;
        if changed {
            write_atomic(&self.path, &tabs)?;
            tracing::debug!(path = %self.path.display(), "row store saved");
        }
        Ok(value)
    }
}

impl RowStore for JsonFileStore {
    fn read_rows(&self, tab: &str) -> Result<Vec<Row>, SheetError> {
        Ok(self.load()?.rows(tab)?.to_vec())
    }

    fn append_row(&self, tab: &str, row: Row) -> Result<usize, SheetError> {
        self.mutate(|tabs| Ok((tabs.append_row(tab, row)?, true)))
    }

    fn update_cell(
        &self,
        tab: &str,
        row: usize,
        col: usize,
        value: &str,
    ) -> Result<(), SheetError> {
        self.mutate(|tabs| {
            tabs.update_cell(tab, row, col, value)?;
            Ok(((), true))
        })
    }

    fn ensure_tab(&self, tab: &str, headers: &[&str]) -> Result<(), SheetError> {
        self.mutate(|tabs| Ok(((), tabs.ensure_tab(tab, headers))))
    }
}

pub fn lock_path(store_path: &Path) -> PathBuf {
    sibling(store_path, ".lock")
}

/// `<path><suffix>` next to the store file.
fn sibling(store_path: &Path, suffix: &str) -> PathBuf {
    let mut path: OsString = store_path.as_os_str().to_os_string();
    path.push(suffix);
    PathBuf::from(path)
}

/// Attach the offending path to an io failure.
trait AtPath<T> {
    fn at(self, path: &Path) -> Result<T, SheetError>;
}

impl<T> AtPath<T> for std::io::Result<T> {
    fn at(self, path: &Path) -> Result<T, SheetError> {
        self.map_err(|err| SheetError::io(path, err))
    }
}

fn ensure_parent(path: &Path) -> Result<(), SheetError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).at(parent),
        _ => Ok(()),
    }
}

/// Serialize the whole store, write it beside the target, sync, then rename
/// over the target. A failed write leaves the previous file in place.
fn write_atomic(path: &Path, tabs: &Tabs) -> Result<(), SheetError> {
    let mut body =
        serde_json::to_string_pretty(tabs).map_err(|e| SheetError::Serialize(e.to_string()))?;
    body.push('\n');
    ensure_parent(path)?;

    let staged = sibling(path, &format!(".tmp.{}", std::process::id()));
    let result = File::create(&staged)
        .and_then(|mut file| {
            file.write_all(body.as_bytes())?;
            file.sync_all()
        })
        .at(&staged)
        .and_then(|()| fs::rename(&staged, path).at(path));
    if result.is_err() {
        let _ = fs::remove_file(&staged);
    }
    result
}

fn validate_bytes<'a>(path: &Path, bytes: &'a [u8]) -> Result<&'a str, SheetError> {
    let corrupt = |what: &str| SheetError::Corrupt(format!("{}: {what}", path.display()));
    if bytes.contains(&0) {
        return Err(corrupt("contains NUL byte(s)"));
    }
    std::str::from_utf8(bytes).map_err(|_| corrupt("contains non-UTF-8 byte sequence(s)"))
}

/// Holds `<path>.lock` for the lifetime of one mutation.
struct StoreLockGuard {
    lock_path: PathBuf,
}

impl StoreLockGuard {
    fn acquire(store_path: &Path) -> Result<Self, SheetError> {
        let lock_path = lock_path(store_path);
        ensure_parent(&lock_path)?;

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                tracing::warn!(lock = %lock_path.display(), "row store is locked");
                return Err(SheetError::LockBusy {
                    lock_path: lock_path.display().to_string(),
                });
            }
            Err(err) => return Err(SheetError::io(&lock_path, err)),
        };
        // Holder details are informational; the lock is the file's existence.
        let _ = writeln!(file, "{} {}", std::process::id(), Utc::now().to_rfc3339());
        Ok(Self { lock_path })
    }
}

impl Drop for StoreLockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(prefix: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "somatic-sheet-{prefix}-{}-{unique}.json",
            std::process::id()
        ))
    }

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let store = JsonFileStore::new(temp_path("missing"));
        assert_eq!(store.load().expect("load"), Tabs::default());
        assert!(matches!(
            store.read_rows("QUEUE"),
            Err(SheetError::TabNotFound(_))
        ));
    }

    #[test]
    fn mutations_persist_and_release_the_lock() {
        let path = temp_path("persist");
        let store = JsonFileStore::new(&path);
        store.ensure_tab("QUEUE", &["Date", "Status"]).expect("ensure");
        store.append_row("QUEUE", row(&["2026-10-18", "READY"])).expect("append");
        store.update_cell("QUEUE", 2, 2, "DONE").expect("update");
        assert!(!store.lock_path().exists());

        let reopened = JsonFileStore::new(&path);
        assert_eq!(
            reopened.read_rows("QUEUE").expect("rows"),
            vec![row(&["Date", "Status"]), row(&["2026-10-18", "DONE"])]
        );

        let _ = fs::remove_file(path);
    }

    #[test]
    fn held_lock_is_reported_busy() {
        let path = temp_path("busy");
        let store = JsonFileStore::new(&path);
        fs::write(store.lock_path(), "pid=0\n").expect("lock fixture");

        let result = store.ensure_tab("QUEUE", &["Date"]);
        assert!(matches!(result, Err(SheetError::LockBusy { .. })));
        assert!(!path.exists());

        let _ = fs::remove_file(store.lock_path());
    }

    #[test]
    fn failed_mutation_leaves_the_file_alone() {
        let path = temp_path("failed");
        let store = JsonFileStore::new(&path);
        store.ensure_tab("T", &["A"]).expect("ensure");
        let before = fs::read_to_string(&path).expect("read");

        let result = store.update_cell("T", 9, 1, "x");
        assert!(matches!(result, Err(SheetError::CellOutOfRange { .. })));
        assert_eq!(fs::read_to_string(&path).expect("read"), before);
        assert!(!store.lock_path().exists());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn save_leaves_no_staged_file_behind() {
        let path = temp_path("staged");
        let store = JsonFileStore::new(&path);
        store.ensure_tab("T", &["A"]).expect("ensure");
        assert!(path.exists());
        assert!(!sibling(&path, &format!(".tmp.{}", std::process::id())).exists());

        // A directory where the file should be makes the rename fail.
        let blocked = temp_path("blocked");
        fs::create_dir_all(&blocked).expect("blocking dir");
        let err = write_atomic(&blocked, &store.load().expect("load")).expect_err("rename");
        assert!(matches!(err, SheetError::Io { .. }));
        assert!(!sibling(&blocked, &format!(".tmp.{}", std::process::id())).exists());

        let _ = fs::remove_dir_all(blocked);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn corrupt_file_is_rejected() {
        let path = temp_path("corrupt");
        fs::write(&path, [0xff, 0xfe, 0xfd]).expect("fixture should write");
        match JsonFileStore::new(&path).load() {
            Err(SheetError::Corrupt(message)) => assert!(message.contains("non-UTF-8")),
            other => panic!("expected corrupt store error, got {other:?}"),
        }
        let _ = fs::remove_file(path);
    }
}
