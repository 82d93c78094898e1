//! Batch runs over a directory of cards.
//!
//! Each card is independent: a read failure or pipeline error is recorded on
//! its item and the rest of the batch carries on.

use crate::error::PipelineError;
use crate::pipeline::{FinalStatus, Pipeline};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use somatic_gates::{Status, WireReport};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    ValidateOnly,
    Pipeline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub path: PathBuf,
    /// `PASS`/`FAIL` in validate mode, the final pipeline status otherwise,
    /// `ERROR` when the card could not be processed.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<WireReport>,
    /// Final document text when a pipeline run changed the card.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_document: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    /// Item count per status string.
    pub by_status: BTreeMap<String, usize>,
    pub items: Vec<BatchItem>,
}

impl BatchSummary {
    pub fn errors(&self) -> usize {
        self.by_status.get(ERROR_STATUS).copied().unwrap_or(0)
    }

    /// Whether every item passed (after repair, in pipeline mode).
    pub fn all_passed(&self) -> bool {
        self.items.iter().all(|item| {
            item.status == Status::Pass.as_str()
                || item.status == FinalStatus::PassAfterRewrite.as_str()
        })
    }
}

const ERROR_STATUS: &str = "ERROR";

/// Cards found under a batch root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardListing {
    /// Every `*.md` file, sorted.
    pub paths: Vec<PathBuf>,
    /// Subdirectories that could not be listed, with the reason.
    pub unreadable: Vec<(PathBuf, String)>,
}

/// Every `*.md` file under `dir`, recursively, in sorted order.
///
/// Only an unreadable `dir` is an error. Unreadable subdirectories are
/// recorded on the listing, and symlinked directories are not followed.
pub fn collect_markdown(dir: &Path) -> Result<CardListing, PipelineError> {
    let entries = std::fs::read_dir(dir).map_err(|source| PipelineError::Read {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut listing = CardListing::default();
    walk(entries, dir, &mut listing);
    listing.paths.sort();
    listing.unreadable.sort();
    Ok(listing)
}

fn walk(entries: std::fs::ReadDir, dir: &Path, listing: &mut CardListing) {
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                listing.unreadable.push((dir.to_path_buf(), err.to_string()));
                continue;
            }
        };
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            match std::fs::read_dir(&path) {
                Ok(children) => walk(children, &path, listing),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "directory skipped");
                    listing.unreadable.push((path, err.to_string()));
                }
            }
        } else if file_type.is_symlink() && path.is_dir() {
            tracing::debug!(path = %path.display(), "symlinked directory not followed");
        } else if path.extension().is_some_and(|ext| ext == "md") {
            listing.paths.push(path);
        }
    }
}

/// Process the listed cards in parallel. Unreadable directories become
/// `ERROR` items; items are ordered by path.
pub fn run_batch(pipeline: &Pipeline, listing: &CardListing, mode: BatchMode) -> BatchSummary {
    let mut items: Vec<BatchItem> = listing
        .paths
        .par_iter()
        .map(|path| process(pipeline, path, mode))
        .collect();
    for (path, error) in &listing.unreadable {
        items.push(error_item(
            path,
            format!("failed to read {}: {error}", path.display()),
        ));
    }
    items.sort_by(|a, b| a.path.cmp(&b.path));

    let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
    for item in &items {
        *by_status.entry(item.status.clone()).or_default() += 1;
    }
    tracing::info!(total = items.len(), ?by_status, "batch finished");
    BatchSummary {
        total: items.len(),
        by_status,
        items,
    }
}

fn error_item(path: &Path, error: String) -> BatchItem {
    BatchItem {
        path: path.to_path_buf(),
        status: ERROR_STATUS.to_string(),
        report: None,
        final_document: None,
        error: Some(error),
    }
}

fn process(pipeline: &Pipeline, path: &Path, mode: BatchMode) -> BatchItem {
    match try_process(pipeline, path, mode) {
        Ok(item) => item,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "batch item failed");
            error_item(path, err.to_string())
        }
    }
}

fn try_process(
    pipeline: &Pipeline,
    path: &Path,
    mode: BatchMode,
) -> Result<BatchItem, PipelineError> {
    let text = std::fs::read_to_string(path).map_err(|source| PipelineError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let item = match mode {
        BatchMode::ValidateOnly => {
            let report = pipeline.validate(&text, None);
            BatchItem {
                path: path.to_path_buf(),
                status: report.status.as_str().to_string(),
                report: Some(report.to_wire()),
                final_document: None,
                error: None,
            }
        }
        BatchMode::Pipeline => {
            let outcome = pipeline.run(&text, None)?;
            let final_document = (outcome.attempt_count > 1)
                .then(|| outcome.final_document().to_string());
            BatchItem {
                path: path.to_path_buf(),
                status: outcome.final_status.as_str().to_string(),
                report: outcome.final_report().map(|r| r.to_wire()),
                final_document,
                error: None,
            }
        }
    };
    Ok(item)
}
