//! Error types for pipeline configuration and runs.

use somatic_gates::RuleSetError;
use somatic_repair::{GenerationError, RepairError};
use std::path::PathBuf;

/// Errors loading a [`PipelineConfig`](crate::config::PipelineConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Rules(#[from] RuleSetError),
}

/// Errors that stop a pipeline run.
///
/// A card that still fails after its repair is not an error; it is a
/// `FAIL_AFTER_REWRITE` outcome.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Repair(#[from] RepairError),

    /// The generator could not be built (for example, no API key).
    #[error("generator unavailable: {0}")]
    Generator(#[from] GenerationError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
