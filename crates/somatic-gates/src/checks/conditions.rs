use crate::gate::{Gate, GateResult};
use crate::ids::GateId;
use crate::reason::ReasonCode;
use crate::rules::RuleSet;
use somatic_doc::Document;

/// Top-of-document declarations: a Pass Condition always, and exactly one
/// single-line Unlock Rule when the card is locked.
pub struct ConditionsGate;

impl Gate for ConditionsGate {
    fn id(&self) -> GateId {
        GateId::Conditions
    }

    fn check(&self, doc: &Document, rules: &RuleSet) -> GateResult {
        let mut result = GateResult::new(self.id());
        let keys = &rules.conditions;

        let pass = doc
            .declaration(&keys.pass_condition_key)
            .map(str::trim)
            .unwrap_or_default();
        if pass.is_empty() {
            result.fail(
                ReasonCode::MissingPassCondition,
                format!("{} missing or empty.", keys.pass_condition_key),
            );
        }

        let locked = rules.is_locked(doc);
        result.metric("locked", locked);
        if !locked {
            return result;
        }

        let unlock_key = keys.unlock_rule_key.as_str();
        let count = doc.declaration_count(unlock_key);
        let value = doc.declaration(unlock_key).map(str::trim).unwrap_or_default();
        let problem = if count == 0 || value.is_empty() {
            Some(format!("{unlock_key} required when locked but missing or empty."))
        } else if count > 1 {
            Some(format!("{unlock_key} must appear exactly once, found {count}."))
        } else if doc.declaration_continues(unlock_key) {
            Some(format!("{unlock_key} must be exactly one line."))
        } else {
            None
        };
        if let Some(message) = problem {
            result.fail(ReasonCode::LockedMissingUnlockRule, message);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SectionId;

    fn check(preamble: &str) -> GateResult {
        ConditionsGate.check(&Document::parse(preamble), &RuleSet::default())
    }

    #[test]
    fn unlocked_card_needs_only_a_pass_condition() {
        let result = check("# 카드\n\n✅ 4개 이상 통과\n\n**Pass Condition:** 4개 이상\n");
        assert!(result.passed);
        assert_eq!(result.metrics["locked"], false);
    }

    #[test]
    fn empty_pass_condition_fails() {
        let result = check("# 카드\n\n✅ 4개 이상 통과\n\n**Pass Condition:**\n");
        assert_eq!(
            result.reason_codes().collect::<Vec<_>>(),
            vec![ReasonCode::MissingPassCondition]
        );
    }

    #[test]
    fn locked_declaration_without_unlock_rule_targets_preview() {
        let result = check(
            "# 카드\n\n✅ 4개 이상 통과\n\n**Pass Condition:** 4개 이상\n**Locked:** true\n",
        );
        assert_eq!(
            result.reason_codes().collect::<Vec<_>>(),
            vec![ReasonCode::LockedMissingUnlockRule]
        );
        assert!(result.implicated_sections.contains(&SectionId::Preview));
        assert_eq!(result.metrics["locked"], true);
    }

    #[test]
    fn unlock_rule_must_be_single_and_one_line() {
        let twice = check(
            "# 카드\n\n🔒 3일 연속 통과\n\n**Pass Condition:** 4개 이상\n**Unlock Rule:** 3일 연속\n**Unlock Rule:** 7일 평균\n",
        );
        assert!(!twice.passed);

        let spilled = check(
            "# 카드\n\n🔒 3일 연속 통과\n\n**Pass Condition:** 4개 이상\n**Unlock Rule:** 3일 연속\n그리고 평균 4점\n",
        );
        assert_eq!(spilled.failures[0].message, "Unlock Rule must be exactly one line.");

        let ok = check(
            "# 카드\n\n🔒 3일 연속 통과\n\n**Pass Condition:** 4개 이상\n**Unlock Rule:** 3일 연속 통과\n",
        );
        assert!(ok.passed);
    }

    #[test]
    fn locked_hint_overrides_the_glyph() {
        let doc = Document::parse("# 카드\n\n🔒 3일 연속 통과\n\n**Pass Condition:** 4개 이상\n")
            .with_locked(false);
        assert!(ConditionsGate.check(&doc, &RuleSet::default()).passed);
    }
}
