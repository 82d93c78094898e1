//! # Somatic repair
//!
//! Rewrites only the sections a validation report flagged, either from
//! fixed templates or through a [`Generator`] behind a bounded
//! [`Backoff`]. Untouched blocks stay byte-identical.

pub mod error;
pub mod generator;
pub mod openai;
pub mod prompt;
pub mod repair;
pub mod retry;
pub mod templates;

pub use error::{GenerationError, RepairError};
pub use generator::{GenerationRequest, Generator};
pub use openai::{GeneratorConfig, OpenAiGenerator};
pub use prompt::{WriterBrief, writer_prompt};
pub use repair::{RepairMode, RepairOutcome, RepairSummary, Repairer, SystemClaimPolicy};
pub use retry::{Backoff, RetryPolicy};
