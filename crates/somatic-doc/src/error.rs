//! Error types for document operations.

/// Errors raised by section-level document edits.
///
/// Malformed documents never produce these; they surface as gate failures.
/// These only fire when a caller asks for an edit that cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// The heading named in a replacement does not exist.
    #[error("section not found: {0}")]
    SectionNotFound(String),

    /// An append targeted a heading that is already present.
    #[error("section already exists: {0}")]
    DuplicateSection(String),

    /// A replacement block carried a level-2 heading other than its own.
    #[error("replacement for `{section}` introduces foreign heading `{heading}`")]
    ForeignHeading { section: String, heading: String },
}
