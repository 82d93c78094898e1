use crate::gate::{Gate, GateResult};
use crate::ids::GateId;
use crate::reason::ReasonCode;
use crate::rules::RuleSet;
use somatic_doc::{Document, heading_key};

/// Every required heading is present, matched by exact title.
pub struct StructureGate;

impl Gate for StructureGate {
    fn id(&self) -> GateId {
        GateId::Structure
    }

    fn check(&self, doc: &Document, rules: &RuleSet) -> GateResult {
        let mut result = GateResult::new(self.id());
        let mut missing = 0usize;
        for &section in &rules.required_sections {
            let Some(title) = rules.heading(section) else {
                continue;
            };
            if !doc.has_section(title) {
                missing += 1;
                result.fail(
                    ReasonCode::Missing(section),
                    format!("Missing heading: {}", heading_key(title)),
                );
            }
        }
        result.metric("missing_sections", missing);
        result
    }
}
