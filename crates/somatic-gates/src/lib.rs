//! # Somatic gates
//!
//! Independent pass/fail checks over a checklist [`Document`](somatic_doc::Document),
//! the reason codes they emit, and the mapper from codes to the sections a
//! repair should rewrite.
//!
//! ```text
//! Document ──► GateEngine ──► [GateResult; 8] ──► ValidationReport
//!                                   │                   │
//!                              ReasonCode ──section()──► rewrite_targets
//! ```
//!
//! The engine never errors on a malformed document; every structural
//! problem is a failing [`GateResult`] with a specific [`ReasonCode`].

pub mod checks;
pub mod error;
pub mod gate;
pub mod ids;
pub mod reason;
pub mod report;
pub mod rules;

pub use error::{GateError, RuleSetError};
pub use gate::{Gate, GateEngine, GateFailure, GateResult};
pub use ids::{GateId, SectionId};
pub use reason::{ReasonCode, parse_reason_codes, rewrite_targets};
pub use report::{Status, ValidationReport, WireReport, split_reason};
pub use rules::RuleSet;
