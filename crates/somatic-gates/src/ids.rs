//! Gate and section identifiers.

use crate::error::GateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Repairable sections of a checklist card.
///
/// Declaration order is the canonical rewrite priority: the derived `Ord`
/// is what makes rewrite-target lists deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SectionId {
    /// Preamble block: preview one-liner plus the condition declarations.
    Preview,
    Definitions,
    Procedure,
    #[serde(rename = "FAQ")]
    Faq,
    SystemClaim,
    Evidence,
    RoutineCard,
    Action,
    ReCheck,
}

impl SectionId {
    pub const ALL: [SectionId; 9] = [
        SectionId::Preview,
        SectionId::Definitions,
        SectionId::Procedure,
        SectionId::Faq,
        SectionId::SystemClaim,
        SectionId::Evidence,
        SectionId::RoutineCard,
        SectionId::Action,
        SectionId::ReCheck,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SectionId::Preview => "Preview",
            SectionId::Definitions => "Definitions",
            SectionId::Procedure => "Procedure",
            SectionId::Faq => "FAQ",
            SectionId::SystemClaim => "SystemClaim",
            SectionId::Evidence => "Evidence",
            SectionId::RoutineCard => "RoutineCard",
            SectionId::Action => "Action",
            SectionId::ReCheck => "ReCheck",
        }
    }

    /// Suffix used in `MISSING_<SECTION>` reason codes.
    pub fn code_suffix(self) -> &'static str {
        match self {
            SectionId::Preview => "PREVIEW",
            SectionId::Definitions => "DEFINITIONS",
            SectionId::Procedure => "PROCEDURE",
            SectionId::Faq => "FAQ",
            SectionId::SystemClaim => "SYSTEM_CLAIM",
            SectionId::Evidence => "EVIDENCE",
            SectionId::RoutineCard => "ROUTINE_CARD",
            SectionId::Action => "ACTION",
            SectionId::ReCheck => "RE_CHECK",
        }
    }

    /// Whether this section is a `## ` heading block (everything but the
    /// preamble preview block).
    pub fn is_heading_block(self) -> bool {
        self != SectionId::Preview
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionId {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionId::ALL
            .into_iter()
            .find(|id| id.as_str() == s.trim())
            .ok_or_else(|| GateError::UnknownSection(s.to_string()))
    }
}

/// Gate identifiers, in evaluation and report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateId {
    Structure,
    Preview,
    Definitions,
    Procedure,
    Faq,
    Conditions,
    Authority,
    Stats,
}

impl GateId {
    pub const ALL: [GateId; 8] = [
        GateId::Structure,
        GateId::Preview,
        GateId::Definitions,
        GateId::Procedure,
        GateId::Faq,
        GateId::Conditions,
        GateId::Authority,
        GateId::Stats,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GateId::Structure => "structure",
            GateId::Preview => "preview",
            GateId::Definitions => "definitions",
            GateId::Procedure => "procedure",
            GateId::Faq => "faq",
            GateId::Conditions => "conditions",
            GateId::Authority => "authority",
            GateId::Stats => "stats",
        }
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GateId {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GateId::ALL
            .into_iter()
            .find(|id| id.as_str() == s.trim())
            .ok_or_else(|| GateError::UnknownGate(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_order_is_rewrite_priority() {
        let mut shuffled = vec![
            SectionId::ReCheck,
            SectionId::Faq,
            SectionId::Preview,
            SectionId::SystemClaim,
            SectionId::Definitions,
        ];
        shuffled.sort();
        assert_eq!(
            shuffled,
            vec![
                SectionId::Preview,
                SectionId::Definitions,
                SectionId::Faq,
                SectionId::SystemClaim,
                SectionId::ReCheck,
            ]
        );
    }

    #[test]
    fn names_round_trip_through_serde_and_from_str() {
        for id in SectionId::ALL {
            let json = serde_json::to_value(id).expect("serialize");
            assert_eq!(json, serde_json::Value::String(id.as_str().to_string()));
            assert_eq!(id.as_str().parse::<SectionId>().ok(), Some(id));
        }
        for id in GateId::ALL {
            let json = serde_json::to_value(id).expect("serialize");
            assert_eq!(json, serde_json::Value::String(id.as_str().to_string()));
            assert_eq!(id.as_str().parse::<GateId>().ok(), Some(id));
        }
        assert!(matches!(
            "Body".parse::<SectionId>(),
            Err(GateError::UnknownSection(_))
        ));
    }
}
