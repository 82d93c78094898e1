//! # Somatic sheet
//!
//! A small spreadsheet-shaped storage layer: named tabs of string rows with
//! a header row. The content queue and the pipeline run ledger live here.
//!
//! - [`RowStore`]: read, append and update capability
//! - [`JsonFileStore`]: one JSON file, lock-scoped atomic rewrites
//! - [`MemoryRowStore`]: process-local store
//! - [`append_idempotent`]: skip rows whose key was recently written

pub mod error;
pub mod file_store;
pub mod idempotent;
pub mod schema;
pub mod store;

pub use error::SheetError;
pub use file_store::JsonFileStore;
pub use idempotent::{AppendOutcome, DEFAULT_WINDOW, append_idempotent, content_key, timestamp};
pub use schema::{QUEUE, QueueColumns, QueueEntry, RUN_LEDGER, TabSchema, queue_entries};
pub use store::{MemoryRowStore, Row, RowStore, Tabs, column_index};
