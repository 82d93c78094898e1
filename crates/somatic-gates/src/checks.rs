//! The built-in gates, one module each.

mod authority;
mod conditions;
mod definitions;
mod faq;
mod preview;
mod procedure;
mod stats;
mod structure;

pub use authority::AuthorityGate;
pub use conditions::ConditionsGate;
pub use definitions::DefinitionsGate;
pub use faq::FaqGate;
pub use preview::{PreviewGate, sentence_marks};
pub use procedure::ProcedureGate;
pub use stats::StatsGate;
pub use structure::StructureGate;

use crate::gate::Gate;

/// All eight gates in evaluation order.
pub fn standard_gates() -> Vec<Box<dyn Gate>> {
    vec![
        Box::new(StructureGate),
        Box::new(PreviewGate),
        Box::new(DefinitionsGate),
        Box::new(ProcedureGate),
        Box::new(FaqGate),
        Box::new(ConditionsGate),
        Box::new(AuthorityGate),
        Box::new(StatsGate),
    ]
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::GateEngine;
    use crate::ids::GateId;
    use crate::rules::RuleSet;
    use somatic_doc::Document;

    #[test]
    fn standard_gates_cover_every_gate_once() {
        let ids: Vec<GateId> = standard_gates().iter().map(|g| g.id()).collect();
        assert_eq!(ids, GateId::ALL.to_vec());
    }

    #[test]
    fn fixture_card_passes_every_gate() {
        let report = GateEngine::standard(RuleSet::default())
            .validate(&Document::parse(fixtures::PASSING), 1);
        let failures: Vec<String> = report
            .gate_results
            .iter()
            .flat_map(|r| r.failures.iter().map(|f| f.reason_string()))
            .collect();
        assert!(report.status.is_pass(), "{failures:?}");
    }
}
