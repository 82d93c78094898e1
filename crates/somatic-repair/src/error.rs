//! Error types for repair and generation.

use somatic_doc::DocumentError;
use somatic_gates::SectionId;

/// Configuration problems that stop a repair outright.
///
/// A collaborator that fails or returns junk is not one of these: the
/// affected section is left unchanged and the repair carries on.
#[derive(Debug, thiserror::Error)]
pub enum RepairError {
    #[error("no heading configured for section {0}")]
    MissingHeading(SectionId),

    #[error("generative repair requested without a generator")]
    NoGenerator,

    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Failure of one generation call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// Network trouble, rate limiting, server errors.
    #[error("transient generation failure: {0}")]
    Transient(String),

    /// The collaborator answered, but not with the required JSON shape.
    #[error("malformed generation output: {0}")]
    Malformed(String),

    /// Missing credentials, rejected requests. Retrying will not help.
    #[error("fatal generation failure: {0}")]
    Fatal(String),
}

impl GenerationError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, GenerationError::Fatal(_))
    }
}
