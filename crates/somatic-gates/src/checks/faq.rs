use crate::gate::{Gate, GateResult};
use crate::ids::{GateId, SectionId};
use crate::reason::ReasonCode;
use crate::rules::RuleSet;
use somatic_doc::{Document, Token, tokenize};

/// The FAQ section holds enough `**Qn.**` / `An.` pairs.
pub struct FaqGate;

impl Gate for FaqGate {
    fn id(&self) -> GateId {
        GateId::Faq
    }

    fn check(&self, doc: &Document, rules: &RuleSet) -> GateResult {
        let mut result = GateResult::new(self.id());
        let pairs = rules
            .section(doc, SectionId::Faq)
            .map(|section| count_pairs(section.body()))
            .unwrap_or(0);
        let min_pairs = rules.faq.min_pairs;

        result.metric("faq_pairs", pairs);
        if pairs < min_pairs {
            result.fail(
                ReasonCode::FaqLt3,
                format!("FAQ needs at least {min_pairs} question/answer pairs, found {pairs}."),
            );
        }
        result
    }
}

/// A question counts once the next non-blank line answers the same number.
fn count_pairs(body: &str) -> usize {
    let mut pairs = 0;
    let mut open: Option<u32> = None;
    for line in tokenize(body) {
        match line.token {
            Token::Blank => {}
            Token::Question { number, .. } => open = Some(number),
            Token::Answer { number, .. } if open == Some(number) => {
                pairs += 1;
                open = None;
            }
            _ => open = None,
        }
    }
    pairs
}
