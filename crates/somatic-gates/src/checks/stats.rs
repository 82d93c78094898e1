use crate::gate::{Gate, GateResult};
use crate::ids::GateId;
use crate::reason::ReasonCode;
use crate::rules::RuleSet;
use somatic_doc::Document;

/// Stats collection is keyed by card id, anonymous and aggregated, and
/// never stores personal identifiers or free text. Checked over the whole
/// document.
pub struct StatsGate;

impl Gate for StatsGate {
    fn id(&self) -> GateId {
        GateId::Stats
    }

    fn check(&self, doc: &Document, rules: &RuleSet) -> GateResult {
        let mut result = GateResult::new(self.id());
        let text = doc.render();
        let stats = &rules.stats;

        if !text.contains(stats.key_term.as_str()) {
            result.fail(
                ReasonCode::StatsMissingKey,
                format!("Must mention {} for stats aggregation.", stats.key_term),
            );
        }
        if !stats.anonymity_terms.iter().all(|t| text.contains(t.as_str())) {
            result.fail(
                ReasonCode::StatsNotAnonymous,
                format!(
                    "Must mention anonymous aggregation ({}).",
                    stats.anonymity_terms.join(" + ")
                ),
            );
        }
        let found: Vec<&str> = stats
            .forbidden_terms
            .iter()
            .map(String::as_str)
            .filter(|t| text.contains(*t))
            .collect();
        if !found.is_empty() {
            result.fail(
                ReasonCode::StatsForbiddenTerm,
                format!(
                    "Must not store personal identifiers or free-text comments: {}.",
                    found.join(", ")
                ),
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SectionId;

    fn check(text: &str) -> GateResult {
        StatsGate.check(&Document::parse(text), &RuleSet::default())
    }

    #[test]
    fn anonymous_card_id_aggregation_passes_anywhere_in_the_card() {
        assert!(check("# 카드\n\n## Routine Card\ncard_id 기준 익명 집계\n").passed);
    }

    #[test]
    fn every_stats_failure_targets_evidence() {
        let result = check("# 카드\n\n## Evidence\nuser_id 와 닉네임을 저장합니다.\n");
        assert_eq!(
            result.reason_codes().collect::<Vec<_>>(),
            vec![
                ReasonCode::StatsMissingKey,
                ReasonCode::StatsNotAnonymous,
                ReasonCode::StatsForbiddenTerm,
            ]
        );
        assert_eq!(
            result.implicated_sections.into_iter().collect::<Vec<_>>(),
            vec![SectionId::Evidence]
        );
    }
}
