//! Two-attempt orchestration: validate, repair once, validate again.
//!
//! ```text
//! Init ─► Validated1 ─┬─► DonePass
//!                     └─► Repairing ─► Validated2 ─┬─► DonePassAfterRewrite
//!                                                  └─► DoneFailAfterRewrite
//! ```
//!
//! There is never a second repair. A card that still fails is a normal
//! outcome and its best-effort document is always returned.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use somatic_doc::Document;
use somatic_gates::{GateEngine, ValidationReport};
use somatic_repair::{Backoff, OpenAiGenerator, RepairMode, RepairSummary, Repairer};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    Validated1,
    DonePass,
    Repairing,
    Validated2,
    DonePassAfterRewrite,
    DoneFailAfterRewrite,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PipelineState::DonePass
                | PipelineState::DonePassAfterRewrite
                | PipelineState::DoneFailAfterRewrite
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalStatus {
    Pass,
    PassAfterRewrite,
    FailAfterRewrite,
}

impl FinalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FinalStatus::Pass => "PASS",
            FinalStatus::PassAfterRewrite => "PASS_AFTER_REWRITE",
            FinalStatus::FailAfterRewrite => "FAIL_AFTER_REWRITE",
        }
    }

    pub fn is_pass(self) -> bool {
        self != FinalStatus::FailAfterRewrite
    }
}

impl fmt::Display for FinalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub run_id: String,
    pub final_status: FinalStatus,
    /// 1 when the draft passed as-is, otherwise 2.
    pub attempt_count: u8,
    /// Document text per attempt; the last entry is the final document.
    pub documents: Vec<String>,
    /// One report per attempt.
    pub reports: Vec<ValidationReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repair: Option<RepairSummary>,
}

impl PipelineOutcome {
    pub fn final_document(&self) -> &str {
        self.documents.last().map(String::as_str).unwrap_or_default()
    }

    pub fn final_report(&self) -> Option<&ValidationReport> {
        self.reports.last()
    }
}

/// Gate engine plus repairer, run as one bounded loop.
pub struct Pipeline {
    engine: GateEngine,
    repairer: Repairer,
}

impl Pipeline {
    pub fn new(engine: GateEngine, repairer: Repairer) -> Self {
        Self { engine, repairer }
    }

    /// Build from configuration. Generative mode reads the API key from
    /// the configured environment variable.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let engine = GateEngine::standard(config.rules.clone());
        let repairer = match config.repair.mode {
            RepairMode::RuleBased => Repairer::rule_based(config.rules.clone()),
            RepairMode::Generative => {
                let generator = OpenAiGenerator::from_env(config.generator.clone())?;
                Repairer::generative(
                    config.rules.clone(),
                    Arc::new(generator),
                    Backoff::new(config.retry),
                )
            }
        }
        .with_claim_policy(config.repair.system_claim);
        Ok(Self::new(engine, repairer))
    }

    pub fn engine(&self) -> &GateEngine {
        &self.engine
    }

    pub fn repairer(&self) -> &Repairer {
        &self.repairer
    }

    /// Validate only; no repair.
    pub fn validate(&self, text: &str, locked_hint: Option<bool>) -> ValidationReport {
        self.engine.validate(&with_hint(text, locked_hint), 1)
    }

    pub fn run(
        &self,
        text: &str,
        locked_hint: Option<bool>,
    ) -> Result<PipelineOutcome, PipelineError> {
        let run_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("pipeline", run_id = %run_id);
        let _enter = span.enter();

        let mut state = PipelineState::Init;
        let draft = with_hint(text, locked_hint);

        let first = self.engine.validate(&draft, 1);
        state = transition(state, PipelineState::Validated1);
        tracing::info!(status = %first.status, targets = ?first.rewrite_targets, "attempt 1 validated");

        if first.status.is_pass() {
            transition(state, PipelineState::DonePass);
            return Ok(PipelineOutcome {
                run_id,
                final_status: FinalStatus::Pass,
                attempt_count: 1,
                documents: vec![text.to_string()],
                reports: vec![first],
                repair: None,
            });
        }

        state = transition(state, PipelineState::Repairing);
        let repaired = self.repairer.repair(
            &draft,
            &first.rewrite_targets,
            &first.reasons_by_section(),
        )?;
        let summary = repaired.summary();
        tracing::info!(changed = ?summary.changed, unchanged = ?summary.unchanged, "repair applied");

        let second = self.engine.validate(&repaired.document, 2);
        state = transition(state, PipelineState::Validated2);
        tracing::info!(status = %second.status, "attempt 2 validated");

        let (terminal, final_status) = if second.status.is_pass() {
            (PipelineState::DonePassAfterRewrite, FinalStatus::PassAfterRewrite)
        } else {
            (PipelineState::DoneFailAfterRewrite, FinalStatus::FailAfterRewrite)
        };
        transition(state, terminal);

        Ok(PipelineOutcome {
            run_id,
            final_status,
            attempt_count: 2,
            documents: vec![text.to_string(), repaired.document.render()],
            reports: vec![first, second],
            repair: Some(summary),
        })
    }
}

fn with_hint(text: &str, locked_hint: Option<bool>) -> Document {
    let doc = Document::parse(text);
    match locked_hint {
        Some(locked) => doc.with_locked(locked),
        None => doc,
    }
}

fn transition(from: PipelineState, to: PipelineState) -> PipelineState {
    tracing::debug!(?from, ?to, terminal = to.is_terminal(), "state transition");
    to
}
