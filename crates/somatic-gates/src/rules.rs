//! The rulebook: required headings, word lists and thresholds.
//!
//! A [`RuleSet`] is immutable once handed to a [`GateEngine`](crate::GateEngine).
//! `RuleSet::default()` is the built-in rulebook; a TOML file can override
//! any subset of it.

use crate::error::RuleSetError;
use crate::ids::SectionId;
use serde::{Deserialize, Serialize};
use somatic_doc::Document;
use std::path::Path;

/// Heading titles (without the `## ` marker) for each heading section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SectionHeadings {
    pub definitions: String,
    pub procedure: String,
    pub faq: String,
    pub system_claim: String,
    pub evidence: String,
    pub routine_card: String,
    pub action: String,
    pub re_check: String,
}

impl Default for SectionHeadings {
    fn default() -> Self {
        Self {
            definitions: "Definitions".to_string(),
            procedure: "Procedure".to_string(),
            faq: "FAQ".to_string(),
            system_claim: "System Claim".to_string(),
            evidence: "Evidence (Optional but recommended)".to_string(),
            routine_card: "Routine Card".to_string(),
            action: "Action (30–60s)".to_string(),
            re_check: "Re-check".to_string(),
        }
    }
}

impl SectionHeadings {
    /// Heading title for `section`; `None` for the preamble preview block.
    pub fn get(&self, section: SectionId) -> Option<&str> {
        let title = match section {
            SectionId::Preview => return None,
            SectionId::Definitions => &self.definitions,
            SectionId::Procedure => &self.procedure,
            SectionId::Faq => &self.faq,
            SectionId::SystemClaim => &self.system_claim,
            SectionId::Evidence => &self.evidence,
            SectionId::RoutineCard => &self.routine_card,
            SectionId::Action => &self.action,
            SectionId::ReCheck => &self.re_check,
        };
        Some(title.as_str())
    }

    /// Reverse lookup from a heading line or bare title.
    pub fn section_for(&self, heading_or_title: &str) -> Option<SectionId> {
        let key = somatic_doc::heading_key(heading_or_title);
        SectionId::ALL
            .into_iter()
            .find(|id| self.get(*id).is_some_and(|t| somatic_doc::heading_key(t) == key))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewRules {
    pub locked_glyph: String,
    pub unlocked_glyph: String,
    pub forbidden_words: Vec<String>,
    pub measurable_words: Vec<String>,
    /// Number of sentence marks at which a preview counts as multi-sentence.
    pub max_sentence_marks: usize,
}

impl Default for PreviewRules {
    fn default() -> Self {
        Self {
            locked_glyph: "🔒".to_string(),
            unlocked_glyph: "✅".to_string(),
            forbidden_words: strings(&[
                "왜", "방법", "팁", "설명", "이유", "노하우", "전략", "최적화",
            ]),
            measurable_words: strings(&["통과", "연속", "이상", "평균", "점"]),
            max_sentence_marks: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefinitionsRules {
    /// Accepted header pairs, compared case-insensitively.
    pub header_pairs: Vec<[String; 2]>,
    pub min_rows: usize,
}

impl Default for DefinitionsRules {
    fn default() -> Self {
        Self {
            header_pairs: vec![
                ["Key".to_string(), "Value".to_string()],
                ["Term".to_string(), "Definition".to_string()],
            ],
            min_rows: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcedureRules {
    pub min_steps: usize,
}

impl Default for ProcedureRules {
    fn default() -> Self {
        Self { min_steps: 4 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FaqRules {
    pub min_pairs: usize,
}

impl Default for FaqRules {
    fn default() -> Self {
        Self { min_pairs: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConditionRules {
    pub pass_condition_key: String,
    pub unlock_rule_key: String,
    pub locked_key: String,
}

impl Default for ConditionRules {
    fn default() -> Self {
        Self {
            pass_condition_key: "Pass Condition".to_string(),
            unlock_rule_key: "Unlock Rule".to_string(),
            locked_key: "Locked".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClaimRules {
    /// Phrases the System Claim block must contain, case-insensitively.
    pub required_phrases: Vec<String>,
}

impl Default for ClaimRules {
    fn default() -> Self {
        Self {
            required_phrases: strings(&[
                "routine card",
                "somatic checklist writing system",
                "card_id",
                "pass/fail",
                "/dashboard/cards.json",
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatsRules {
    pub key_term: String,
    pub anonymity_terms: Vec<String>,
    pub forbidden_terms: Vec<String>,
}

impl Default for StatsRules {
    fn default() -> Self {
        Self {
            key_term: "card_id".to_string(),
            anonymity_terms: strings(&["익명", "집계"]),
            forbidden_terms: strings(&["user_id", "계정", "닉네임", "댓글 저장", "자유 텍스트"]),
        }
    }
}

/// Complete gate configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleSet {
    /// Heading sections the structure gate requires.
    pub required_sections: Vec<SectionId>,
    pub headings: SectionHeadings,
    pub preview: PreviewRules,
    pub definitions: DefinitionsRules,
    pub procedure: ProcedureRules,
    pub faq: FaqRules,
    pub conditions: ConditionRules,
    pub claim: ClaimRules,
    pub stats: StatsRules,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            required_sections: vec![
                SectionId::Definitions,
                SectionId::Procedure,
                SectionId::Faq,
                SectionId::SystemClaim,
                SectionId::Evidence,
                SectionId::RoutineCard,
                SectionId::Action,
                SectionId::ReCheck,
            ],
            headings: SectionHeadings::default(),
            preview: PreviewRules::default(),
            definitions: DefinitionsRules::default(),
            procedure: ProcedureRules::default(),
            faq: FaqRules::default(),
            conditions: ConditionRules::default(),
            claim: ClaimRules::default(),
            stats: StatsRules::default(),
        }
    }
}

impl RuleSet {
    /// Parse and validate a TOML rulebook. Missing fields keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, RuleSetError> {
        let rules: RuleSet = toml::from_str(raw).map_err(|source| RuleSetError::ParseToml {
            path: "<inline>".into(),
            source,
        })?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RuleSetError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| RuleSetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let rules: RuleSet = toml::from_str(&raw).map_err(|source| RuleSetError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;
        rules.validate()?;
        Ok(rules)
    }

    /// Reject rulebooks the gates cannot evaluate.
    pub fn validate(&self) -> Result<(), RuleSetError> {
        if self.required_sections.contains(&SectionId::Preview) {
            return Err(RuleSetError::Invalid(
                "required_sections may only name heading sections, not Preview".to_string(),
            ));
        }
        for section in SectionId::ALL {
            if let Some(title) = self.headings.get(section)
                && title.trim().is_empty()
            {
                return Err(RuleSetError::Invalid(format!(
                    "empty heading configured for {section}"
                )));
            }
        }
        if self.preview.locked_glyph.is_empty() || self.preview.unlocked_glyph.is_empty() {
            return Err(RuleSetError::Invalid(
                "preview glyphs must not be empty".to_string(),
            ));
        }
        if self.preview.max_sentence_marks == 0 {
            return Err(RuleSetError::Invalid(
                "preview.max_sentence_marks must be at least 1".to_string(),
            ));
        }
        if self.definitions.header_pairs.is_empty() {
            return Err(RuleSetError::Invalid(
                "definitions.header_pairs must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Heading title configured for `section`.
    pub fn heading(&self, section: SectionId) -> Option<&str> {
        self.headings.get(section)
    }

    /// The section block for `section`, if the document has it.
    pub fn section<'d>(
        &self,
        doc: &'d Document,
        section: SectionId,
    ) -> Option<&'d somatic_doc::Section> {
        self.heading(section).and_then(|title| doc.section(title))
    }

    /// Locked resolution: the caller's hint, then the `Locked` declaration,
    /// then the preview glyph.
    pub fn is_locked(&self, doc: &Document) -> bool {
        if let Some(hint) = doc.locked_hint() {
            return hint;
        }
        let declared = doc
            .declaration(&self.conditions.locked_key)
            .map(|v| v.trim().to_ascii_lowercase());
        match declared.as_deref() {
            Some("true") => true,
            Some("false") => false,
            _ => doc
                .preview_line()
                .is_some_and(|line| line.starts_with(&self.preview.locked_glyph)),
        }
    }
}

fn strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_validate() {
        RuleSet::default().validate().expect("built-in rules are valid");
    }

    #[test]
    fn toml_overrides_keep_remaining_defaults() {
        let rules = RuleSet::from_toml_str(
            r#"
required_sections = ["Procedure", "FAQ"]

[faq]
min_pairs = 5

[headings]
faq = "자주 묻는 질문"
"#,
        )
        .expect("parse rules");
        assert_eq!(
            rules.required_sections,
            vec![SectionId::Procedure, SectionId::Faq]
        );
        assert_eq!(rules.faq.min_pairs, 5);
        assert_eq!(rules.headings.faq, "자주 묻는 질문");
        assert_eq!(rules.headings.procedure, "Procedure");
        assert_eq!(rules.definitions.min_rows, 4);
    }

    #[test]
    fn preview_cannot_be_a_required_heading() {
        let err = RuleSet::from_toml_str(r#"required_sections = ["Preview"]"#)
            .expect_err("preview is not a heading");
        assert!(matches!(err, RuleSetError::Invalid(_)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = RuleSet::from_toml_str("[faq]\nmin_questions = 3\n").expect_err("unknown key");
        assert!(matches!(err, RuleSetError::ParseToml { .. }));
    }

    #[test]
    fn section_lookup_goes_both_ways() {
        let headings = SectionHeadings::default();
        assert_eq!(headings.get(SectionId::ReCheck), Some("Re-check"));
        assert_eq!(headings.get(SectionId::Preview), None);
        assert_eq!(headings.section_for("## System Claim"), Some(SectionId::SystemClaim));
        assert_eq!(headings.section_for("FAQ"), Some(SectionId::Faq));
        assert_eq!(headings.section_for("## Notes"), None);
    }

    #[test]
    fn locked_resolution_prefers_hint_then_declaration_then_glyph() {
        let rules = RuleSet::default();
        let glyph_only = Document::parse("# T\n\n🔒 3일 연속 통과\n");
        assert!(rules.is_locked(&glyph_only));
        assert!(!rules.is_locked(&glyph_only.clone().with_locked(false)));

        let declared = Document::parse("# T\n\n🔒 3일 연속 통과\n\n**Locked:** FALSE\n");
        assert!(!rules.is_locked(&declared));

        let unlocked = Document::parse("# T\n\n✅ 4개 이상 통과\n");
        assert!(!rules.is_locked(&unlocked));
        assert!(rules.is_locked(&unlocked.with_locked(true)));
    }
}
