//! # Somatic document model
//!
//! In-memory representation of a checklist card: a preamble (title, preview
//! line, declarations) followed by ordered `## ` heading blocks.
//!
//! ```text
//! # Title                       ┐
//! ✅ preview one-liner          │ preamble
//! **Pass Condition:** ...       ┘
//! ## Routine Card               ┐
//! ...                           │ sections, in source order
//! ## FAQ                        ┘
//! ```
//!
//! Parsing is lossless: `Document::parse(text).render() == text`.

pub mod document;
pub mod error;
pub mod token;

pub use document::{Document, Section, heading_key};
pub use error::DocumentError;
pub use token::{Line, Token, classify, strip_bold, table_cells, tokenize};
