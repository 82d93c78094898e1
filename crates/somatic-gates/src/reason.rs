//! Reason codes and the reason → section mapper.
//!
//! Every failure a gate can report is a [`ReasonCode`]. Each code maps to
//! exactly one [`SectionId`]; the mapping is an exhaustive `match`, so a code
//! added without a target section does not compile. Codes that arrive as
//! strings (a stored report, a tool's output) go through [`FromStr`], which
//! rejects anything unknown instead of dropping it.

use crate::error::GateError;
use crate::ids::SectionId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Machine-readable gate failure identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReasonCode {
    /// `MISSING_<SECTION>`: a required heading is absent.
    Missing(SectionId),
    PreviewMissing,
    PreviewBadPrefix,
    PreviewForbiddenWord,
    PreviewNotMeasurable,
    PreviewMultiSentence,
    MissingDefinitionsTable,
    DefinitionsTooFewRows,
    ProcedureTooFewSteps,
    FaqLt3,
    MissingPassCondition,
    LockedMissingUnlockRule,
    SystemClaimIncomplete,
    StatsMissingKey,
    StatsNotAnonymous,
    StatsForbiddenTerm,
}

const FIXED_CODES: &[(ReasonCode, &str)] = &[
    (ReasonCode::PreviewMissing, "PREVIEW_MISSING"),
    (ReasonCode::PreviewBadPrefix, "PREVIEW_BAD_PREFIX"),
    (ReasonCode::PreviewForbiddenWord, "PREVIEW_FORBIDDEN_WORD"),
    (ReasonCode::PreviewNotMeasurable, "PREVIEW_NOT_MEASURABLE"),
    (ReasonCode::PreviewMultiSentence, "PREVIEW_MULTI_SENTENCE"),
    (
        ReasonCode::MissingDefinitionsTable,
        "MISSING_DEFINITIONS_TABLE",
    ),
    (ReasonCode::DefinitionsTooFewRows, "DEFINITIONS_TOO_FEW_ROWS"),
    (ReasonCode::ProcedureTooFewSteps, "PROCEDURE_TOO_FEW_STEPS"),
    (ReasonCode::FaqLt3, "FAQ_LT_3"),
    (ReasonCode::MissingPassCondition, "MISSING_PASS_CONDITION"),
    (
        ReasonCode::LockedMissingUnlockRule,
        "LOCKED_MISSING_UNLOCK_RULE",
    ),
    (ReasonCode::SystemClaimIncomplete, "SYSTEM_CLAIM_INCOMPLETE"),
    (ReasonCode::StatsMissingKey, "STATS_MISSING_KEY"),
    (ReasonCode::StatsNotAnonymous, "STATS_NOT_ANONYMOUS"),
    (ReasonCode::StatsForbiddenTerm, "STATS_FORBIDDEN_TERM"),
];

impl ReasonCode {
    /// The single section responsible for this failure.
    pub fn section(self) -> SectionId {
        match self {
            ReasonCode::Missing(section) => section,
            ReasonCode::PreviewMissing
            | ReasonCode::PreviewBadPrefix
            | ReasonCode::PreviewForbiddenWord
            | ReasonCode::PreviewNotMeasurable
            | ReasonCode::PreviewMultiSentence
            | ReasonCode::MissingPassCondition
            | ReasonCode::LockedMissingUnlockRule => SectionId::Preview,
            ReasonCode::MissingDefinitionsTable | ReasonCode::DefinitionsTooFewRows => {
                SectionId::Definitions
            }
            ReasonCode::ProcedureTooFewSteps => SectionId::Procedure,
            ReasonCode::FaqLt3 => SectionId::Faq,
            ReasonCode::SystemClaimIncomplete => SectionId::SystemClaim,
            ReasonCode::StatsMissingKey
            | ReasonCode::StatsNotAnonymous
            | ReasonCode::StatsForbiddenTerm => SectionId::Evidence,
        }
    }

    /// Every code, `MISSING_<SECTION>` for each heading section included.
    pub fn all() -> Vec<ReasonCode> {
        let mut codes: Vec<ReasonCode> = SectionId::ALL
            .into_iter()
            .filter(|s| s.is_heading_block())
            .map(ReasonCode::Missing)
            .collect();
        codes.extend(FIXED_CODES.iter().map(|(code, _)| *code));
        codes
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let ReasonCode::Missing(section) = self {
            return write!(f, "MISSING_{}", section.code_suffix());
        }
        let name = FIXED_CODES
            .iter()
            .find(|(code, _)| code == self)
            .map(|(_, name)| *name)
            .unwrap_or("UNKNOWN");
        f.write_str(name)
    }
}

impl FromStr for ReasonCode {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((code, _)) = FIXED_CODES.iter().find(|(_, name)| *name == s) {
            return Ok(*code);
        }
        s.strip_prefix("MISSING_")
            .and_then(|suffix| {
                SectionId::ALL
                    .into_iter()
                    .filter(|section| section.is_heading_block())
                    .find(|section| section.code_suffix() == suffix)
            })
            .map(ReasonCode::Missing)
            .ok_or_else(|| GateError::UnknownReasonCode(s.to_string()))
    }
}

impl Serialize for ReasonCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ReasonCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Map failed reason codes to rewrite targets.
///
/// The output is deduplicated and ordered by [`SectionId`] priority, never
/// by discovery order, so equivalent failure sets give identical lists.
pub fn rewrite_targets<'a, I>(codes: I) -> Vec<SectionId>
where
    I: IntoIterator<Item = &'a ReasonCode>,
{
    codes
        .into_iter()
        .map(|code| code.section())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Parse reason-code strings, failing on the first unknown code.
pub fn parse_reason_codes<'a, I>(raw: I) -> Result<Vec<ReasonCode>, GateError>
where
    I: IntoIterator<Item = &'a str>,
{
    raw.into_iter().map(str::parse).collect()
}
