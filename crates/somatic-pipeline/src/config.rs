//! Pipeline configuration file.
//!
//! ```toml
//! [rules.faq]
//! min_pairs = 3
//!
//! [repair]
//! mode = "generative"
//! system_claim = "boilerplate"
//!
//! [retry]
//! max_attempts = 3
//!
//! [generator]
//! model = "gpt-4o-mini"
//! ```
//!
//! Every table and field is optional.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use somatic_gates::RuleSet;
use somatic_repair::{GeneratorConfig, RepairMode, RetryPolicy, SystemClaimPolicy};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepairConfig {
    pub mode: RepairMode,
    pub system_claim: SystemClaimPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub rules: RuleSet,
    pub repair: RepairConfig,
    pub retry: RetryPolicy,
    pub generator: GeneratorConfig,
}

impl PipelineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Self::parse(raw, Path::new("<inline>"))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw, path)
    }

    /// Load `path` when given, else the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_path(path),
            None => Ok(Self::default()),
        }
    }

    fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.rules.validate()?;
        Ok(config)
    }
}
