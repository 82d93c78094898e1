use crate::gate::{Gate, GateResult};
use crate::ids::{GateId, SectionId};
use crate::reason::ReasonCode;
use crate::rules::RuleSet;
use somatic_doc::{Document, Token, tokenize};

/// The Procedure section lists enough numbered steps.
pub struct ProcedureGate;

impl Gate for ProcedureGate {
    fn id(&self) -> GateId {
        GateId::Procedure
    }

    fn check(&self, doc: &Document, rules: &RuleSet) -> GateResult {
        let mut result = GateResult::new(self.id());
        let Some(section) = rules.section(doc, SectionId::Procedure) else {
            result.metric("procedure_steps", 0);
            result.fail(
                ReasonCode::Missing(SectionId::Procedure),
                "Procedure section is missing.",
            );
            return result;
        };

        let steps = tokenize(section.body())
            .iter()
            .filter(|line| matches!(line.token, Token::NumberedItem { .. }))
            .count();
        let min_steps = rules.procedure.min_steps;
        result.metric("procedure_steps", steps);
        if steps < min_steps {
            result.fail(
                ReasonCode::ProcedureTooFewSteps,
                format!("Procedure needs at least {min_steps} numbered steps, found {steps}."),
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(body: &str) -> GateResult {
        let text = format!("# 카드\n\n## Procedure\n{body}");
        ProcedureGate.check(&Document::parse(&text), &RuleSet::default())
    }

    #[test]
    fn dot_and_paren_steps_both_count() {
        let result = check("1. 준비\n2) 실행\n3. 확인\n4) 기록\n");
        assert!(result.passed);
        assert_eq!(result.metrics["procedure_steps"], 4);
    }

    #[test]
    fn bullets_are_not_steps() {
        let result = check("1. 준비\n- 실행\n- 확인\n2. 기록\n");
        assert_eq!(
            result.reason_codes().collect::<Vec<_>>(),
            vec![ReasonCode::ProcedureTooFewSteps]
        );
        assert_eq!(result.metrics["procedure_steps"], 2);
    }

    #[test]
    fn missing_section_shares_the_structure_code() {
        let result = ProcedureGate.check(&Document::parse("# 카드\n"), &RuleSet::default());
        assert_eq!(
            result.reason_codes().collect::<Vec<_>>(),
            vec![ReasonCode::Missing(SectionId::Procedure)]
        );
    }
}
