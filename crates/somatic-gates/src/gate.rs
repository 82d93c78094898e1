//! Gate trait, per-gate results, and the engine that runs them.
//!
//! Gates are independent pure checks over an immutable [`Document`]. The
//! engine runs every gate, sorts the results into [`GateId`] order and folds
//! them into a [`ValidationReport`]. Gate order never changes the outcome.

use crate::checks;
use crate::ids::{GateId, SectionId};
use crate::reason::{ReasonCode, rewrite_targets};
use crate::report::{Status, ValidationReport};
use crate::rules::RuleSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use somatic_doc::Document;
use std::collections::{BTreeMap, BTreeSet};

/// One failure reported by a gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateFailure {
    pub code: ReasonCode,
    /// Human-readable description.
    pub message: String,
}

impl GateFailure {
    pub fn new(code: ReasonCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Wire form: `"<CODE>: <message>"`.
    pub fn reason_string(&self) -> String {
        format!("{}: {}", self.code, self.message)
    }
}

/// Outcome of a single gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    pub gate: GateId,
    pub passed: bool,
    pub failures: Vec<GateFailure>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metrics: BTreeMap<String, Value>,
    pub implicated_sections: BTreeSet<SectionId>,
}

impl GateResult {
    /// A passing result with no failures.
    pub fn new(gate: GateId) -> Self {
        Self {
            gate,
            passed: true,
            failures: Vec::new(),
            metrics: BTreeMap::new(),
            implicated_sections: BTreeSet::new(),
        }
    }

    /// Record a failure; the result stops passing and the code's section is
    /// implicated.
    pub fn fail(&mut self, code: ReasonCode, message: impl Into<String>) {
        self.passed = false;
        self.implicated_sections.insert(code.section());
        self.failures.push(GateFailure::new(code, message));
    }

    pub fn metric(&mut self, name: &str, value: impl Into<Value>) {
        self.metrics.insert(name.to_string(), value.into());
    }

    pub fn reason_codes(&self) -> impl Iterator<Item = ReasonCode> + '_ {
        self.failures.iter().map(|f| f.code)
    }
}

/// An independent pass/fail rule over a document.
pub trait Gate: Send + Sync {
    fn id(&self) -> GateId;

    fn check(&self, doc: &Document, rules: &RuleSet) -> GateResult;
}

/// Runs a fixed set of gates against one rulebook.
pub struct GateEngine {
    rules: RuleSet,
    gates: Vec<Box<dyn Gate>>,
}

impl GateEngine {
    /// The eight built-in gates over `rules`.
    pub fn standard(rules: RuleSet) -> Self {
        Self::with_gates(rules, checks::standard_gates())
    }

    pub fn with_gates(rules: RuleSet, gates: Vec<Box<dyn Gate>>) -> Self {
        Self { rules, gates }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn gate_ids(&self) -> Vec<GateId> {
        self.gates.iter().map(|g| g.id()).collect()
    }

    /// Evaluate every gate. Structural problems become failures, never errors.
    pub fn validate(&self, doc: &Document, attempt: u8) -> ValidationReport {
        let mut gate_results: Vec<GateResult> = self
            .gates
            .iter()
            .map(|gate| {
                let result = gate.check(doc, &self.rules);
                tracing::debug!(
                    gate = %result.gate,
                    passed = result.passed,
                    failures = result.failures.len(),
                    "gate evaluated"
                );
                result
            })
            .collect();
        gate_results.sort_by_key(|r| r.gate);

        let mut seen = BTreeSet::new();
        let failed_reason_codes: Vec<ReasonCode> = gate_results
            .iter()
            .flat_map(|r| r.reason_codes())
            .filter(|code| seen.insert(*code))
            .collect();

        let metrics = gate_results
            .iter()
            .flat_map(|r| r.metrics.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect();

        let status = if gate_results.iter().all(|r| r.passed) {
            Status::Pass
        } else {
            Status::Fail
        };

        ValidationReport {
            status,
            attempt,
            rewrite_targets: rewrite_targets(&failed_reason_codes),
            failed_reason_codes,
            gate_results,
            metrics,
        }
    }
}

impl Default for GateEngine {
    fn default() -> Self {
        Self::standard(RuleSet::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysFails(GateId, ReasonCode);

    impl Gate for AlwaysFails {
        fn id(&self) -> GateId {
            self.0
        }

        fn check(&self, _doc: &Document, _rules: &RuleSet) -> GateResult {
            let mut result = GateResult::new(self.0);
            result.fail(self.1, "always");
            result
        }
    }

    #[test]
    fn failure_implicates_the_mapped_section() {
        let mut result = GateResult::new(GateId::Faq);
        assert!(result.passed);
        result.fail(ReasonCode::FaqLt3, "too few");
        assert!(!result.passed);
        assert_eq!(
            result.implicated_sections.iter().copied().collect::<Vec<_>>(),
            vec![SectionId::Faq]
        );
        assert_eq!(result.failures[0].reason_string(), "FAQ_LT_3: too few");
    }

    #[test]
    fn results_are_sorted_and_codes_deduplicated() {
        let engine = GateEngine::with_gates(
            RuleSet::default(),
            vec![
                Box::new(AlwaysFails(GateId::Authority, ReasonCode::Missing(SectionId::SystemClaim))),
                Box::new(AlwaysFails(GateId::Structure, ReasonCode::Missing(SectionId::SystemClaim))),
                Box::new(AlwaysFails(GateId::Faq, ReasonCode::FaqLt3)),
            ],
        );
        let report = engine.validate(&Document::parse("# T\n"), 1);

        assert_eq!(report.status, Status::Fail);
        assert_eq!(
            report.gate_results.iter().map(|r| r.gate).collect::<Vec<_>>(),
            vec![GateId::Structure, GateId::Faq, GateId::Authority]
        );
        assert_eq!(
            report.failed_reason_codes,
            vec![ReasonCode::Missing(SectionId::SystemClaim), ReasonCode::FaqLt3]
        );
        assert_eq!(report.rewrite_targets, vec![SectionId::Faq, SectionId::SystemClaim]);
    }

    #[test]
    fn no_gates_means_pass() {
        let engine = GateEngine::with_gates(RuleSet::default(), Vec::new());
        let report = engine.validate(&Document::parse(""), 2);
        assert_eq!(report.status, Status::Pass);
        assert_eq!(report.attempt, 2);
        assert!(report.rewrite_targets.is_empty());
    }
}
