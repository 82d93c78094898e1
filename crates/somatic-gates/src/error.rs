//! Error types for gate configuration and report decoding.

use std::path::PathBuf;

/// Errors from decoding identifiers and stored reports.
///
/// A document that fails a gate is not an error; it is a failing report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("unknown reason code: {0}")]
    UnknownReasonCode(String),

    #[error("unknown section: {0}")]
    UnknownSection(String),

    #[error("unknown gate: {0}")]
    UnknownGate(String),

    /// A stored report is structurally unusable.
    #[error("malformed report: {0}")]
    Report(String),
}

/// Errors loading or validating a [`RuleSet`](crate::rules::RuleSet).
#[derive(Debug, thiserror::Error)]
pub enum RuleSetError {
    #[error("failed to read rules from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rules from {path}: {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid rules: {0}")]
    Invalid(String),
}
