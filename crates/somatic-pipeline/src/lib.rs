//! # Somatic pipeline
//!
//! Validates a card, repairs the flagged sections once, and validates again.
//! A card that still fails after its single repair ends as
//! `FAIL_AFTER_REWRITE` with its best-effort document; the loop is bounded.
//! [`batch`] fans the same run out over a directory of cards.

pub mod batch;
pub mod config;
pub mod error;
pub mod pipeline;

pub use batch::{BatchItem, BatchMode, BatchSummary, CardListing, collect_markdown, run_batch};
pub use config::{PipelineConfig, RepairConfig};
pub use error::{ConfigError, PipelineError};
pub use pipeline::{FinalStatus, Pipeline, PipelineOutcome, PipelineState};
