//! Validation reports and their stable JSON wire shape.

use crate::error::GateError;
use crate::gate::GateResult;
use crate::ids::{GateId, SectionId};
use crate::reason::{ReasonCode, rewrite_targets};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pass,
    Fail,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
        }
    }

    pub fn is_pass(self) -> bool {
        self == Status::Pass
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full result of one validation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub status: Status,
    /// 1 for the first pass, 2 after the repair.
    pub attempt: u8,
    /// Sorted by [`GateId`].
    pub gate_results: Vec<GateResult>,
    /// Flattened in gate order, first occurrence kept.
    pub failed_reason_codes: Vec<ReasonCode>,
    pub rewrite_targets: Vec<SectionId>,
    pub metrics: BTreeMap<String, Value>,
}

impl ValidationReport {
    pub fn failed_gates(&self) -> Vec<GateId> {
        self.gate_results
            .iter()
            .filter(|r| !r.passed)
            .map(|r| r.gate)
            .collect()
    }

    /// Reason strings grouped by the section each code maps to.
    pub fn reasons_by_section(&self) -> BTreeMap<SectionId, Vec<String>> {
        let mut grouped: BTreeMap<SectionId, Vec<String>> = BTreeMap::new();
        for failure in self.gate_results.iter().flat_map(|r| &r.failures) {
            grouped
                .entry(failure.code.section())
                .or_default()
                .push(failure.reason_string());
        }
        grouped
    }

    pub fn to_wire(&self) -> WireReport {
        let reasons = self
            .gate_results
            .iter()
            .filter(|r| !r.passed)
            .map(|r| {
                let lines = r.failures.iter().map(|f| f.reason_string()).collect();
                (r.gate.as_str().to_string(), lines)
            })
            .collect();
        WireReport {
            status: self.status,
            failed_gates: self.failed_gates(),
            failed_sections: self.rewrite_targets.clone(),
            reasons,
        }
    }
}

/// The JSON contract consumed by `rewrite` and by external tooling.
///
/// ```json
/// {
///   "status": "FAIL",
///   "failed_gates": ["structure", "faq"],
///   "failed_sections": ["FAQ"],
///   "reasons": { "faq": ["FAQ_LT_3: ..."] }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireReport {
    pub status: Status,
    pub failed_gates: Vec<GateId>,
    pub failed_sections: Vec<SectionId>,
    /// Gate name → `"<CODE>: <message>"` lines.
    #[serde(default)]
    pub reasons: BTreeMap<String, Vec<String>>,
}

impl WireReport {
    pub fn from_json_str(raw: &str) -> Result<Self, GateError> {
        serde_json::from_str(raw).map_err(|e| GateError::Report(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, GateError> {
        serde_json::to_string_pretty(self).map_err(|e| GateError::Report(e.to_string()))
    }

    /// Codes recovered from the reason strings, in gate/line order.
    pub fn reason_codes(&self) -> Result<Vec<ReasonCode>, GateError> {
        self.reasons
            .values()
            .flatten()
            .map(|line| split_reason(line).0.parse())
            .collect()
    }

    /// Reason strings grouped by section. Unknown codes are errors.
    pub fn reasons_by_section(&self) -> Result<BTreeMap<SectionId, Vec<String>>, GateError> {
        let mut grouped: BTreeMap<SectionId, Vec<String>> = BTreeMap::new();
        for line in self.reasons.values().flatten() {
            let code: ReasonCode = split_reason(line).0.parse()?;
            grouped.entry(code.section()).or_default().push(line.clone());
        }
        Ok(grouped)
    }

    /// Sections to repair: the mapped reason codes united with the listed
    /// `failed_sections`, in priority order.
    pub fn rewrite_targets(&self) -> Result<Vec<SectionId>, GateError> {
        let codes = self.reason_codes()?;
        let mut targets: BTreeSet<SectionId> = rewrite_targets(&codes).into_iter().collect();
        targets.extend(self.failed_sections.iter().copied());
        Ok(targets.into_iter().collect())
    }
}

/// Split `"CODE: message"` at the first `": "`.
pub fn split_reason(line: &str) -> (&str, &str) {
    match line.split_once(": ") {
        Some((code, message)) => (code.trim(), message),
        None => (line.trim(), ""),
    }
}
