use crate::gate::{Gate, GateResult};
use crate::ids::{GateId, SectionId};
use crate::reason::ReasonCode;
use crate::rules::RuleSet;
use somatic_doc::Document;

/// The System Claim section names the system and its index.
pub struct AuthorityGate;

impl Gate for AuthorityGate {
    fn id(&self) -> GateId {
        GateId::Authority
    }

    fn check(&self, doc: &Document, rules: &RuleSet) -> GateResult {
        let mut result = GateResult::new(self.id());
        let Some(section) = rules.section(doc, SectionId::SystemClaim) else {
            result.metric("system_claim_missing_phrases", rules.claim.required_phrases.len());
            result.fail(
                ReasonCode::Missing(SectionId::SystemClaim),
                "System Claim section is missing.",
            );
            return result;
        };

        let body = section.body().to_lowercase();
        let missing: Vec<&str> = rules
            .claim
            .required_phrases
            .iter()
            .map(String::as_str)
            .filter(|phrase| !body.contains(&phrase.to_lowercase()))
            .collect();
        result.metric("system_claim_missing_phrases", missing.len());
        if !missing.is_empty() {
            result.fail(
                ReasonCode::SystemClaimIncomplete,
                format!("System Claim is missing: {}.", missing.join(", ")),
            );
        }
        result
    }
}
