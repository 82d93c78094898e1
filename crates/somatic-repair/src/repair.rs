//! Targeted section repair.
//!
//! Only the sections named as rewrite targets change. Every other block of
//! the document stays byte-identical, and headings keep their order; an
//! absent section is appended at the end of the document.

use crate::error::RepairError;
use crate::generator::{
    GenerationRequest, Generator, PreviewPatch, preview_patch, section_markdown,
};
use crate::prompt::{SectionPromptInput, section_prompt};
use crate::retry::Backoff;
use crate::templates::{self, DEFAULT_PASS_CONDITION, DEFAULT_UNLOCK_RULE};
use serde::{Deserialize, Serialize};
use somatic_doc::{Document, DocumentError};
use somatic_gates::checks::{ConditionsGate, PreviewGate};
use somatic_gates::{Gate, ReasonCode, RuleSet, SectionId};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairMode {
    /// Fixed templates; no collaborator.
    #[default]
    #[serde(alias = "rule")]
    RuleBased,
    /// Rewrites come from a [`Generator`].
    #[serde(alias = "llm")]
    Generative,
}

/// Where the System Claim block comes from in generative mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemClaimPolicy {
    /// Always the canonical template.
    #[default]
    Boilerplate,
    /// Routed to the generator like any other section.
    Generative,
}

/// Which targets changed, and which were left as they were.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairSummary {
    pub changed: Vec<SectionId>,
    pub unchanged: Vec<SectionId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairOutcome {
    pub document: Document,
    pub changed: Vec<SectionId>,
    pub unchanged: Vec<SectionId>,
}

impl RepairOutcome {
    pub fn summary(&self) -> RepairSummary {
        RepairSummary {
            changed: self.changed.clone(),
            unchanged: self.unchanged.clone(),
        }
    }
}

/// Rewrites failed sections.
#[derive(Clone)]
pub struct Repairer {
    rules: RuleSet,
    mode: RepairMode,
    claim_policy: SystemClaimPolicy,
    generator: Option<Arc<dyn Generator>>,
    backoff: Backoff,
}

impl std::fmt::Debug for Repairer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repairer")
            .field("mode", &self.mode)
            .field("claim_policy", &self.claim_policy)
            .field("has_generator", &self.generator.is_some())
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl Repairer {
    pub fn rule_based(rules: RuleSet) -> Self {
        Self {
            rules,
            mode: RepairMode::RuleBased,
            claim_policy: SystemClaimPolicy::default(),
            generator: None,
            backoff: Backoff::default(),
        }
    }

    pub fn generative(rules: RuleSet, generator: Arc<dyn Generator>, backoff: Backoff) -> Self {
        Self {
            rules,
            mode: RepairMode::Generative,
            claim_policy: SystemClaimPolicy::default(),
            generator: Some(generator),
            backoff,
        }
    }

    pub fn with_claim_policy(mut self, policy: SystemClaimPolicy) -> Self {
        self.claim_policy = policy;
        self
    }

    pub fn mode(&self) -> RepairMode {
        self.mode
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Rewrite each target in priority order.
    ///
    /// `reasons` holds the `"<CODE>: <message>"` lines per section. A
    /// generation failure leaves that section unchanged; only configuration
    /// problems are returned as errors.
    pub fn repair(
        &self,
        doc: &Document,
        targets: &[SectionId],
        reasons: &BTreeMap<SectionId, Vec<String>>,
    ) -> Result<RepairOutcome, RepairError> {
        if self.mode == RepairMode::Generative && self.generator.is_none() {
            return Err(RepairError::NoGenerator);
        }
        let mut ordered = targets.to_vec();
        ordered.sort();
        ordered.dedup();

        let mut current = doc.clone();
        let mut changed = Vec::new();
        let mut unchanged = Vec::new();
        let no_reasons = Vec::new();

        for section in ordered {
            let section_reasons = reasons.get(&section).unwrap_or(&no_reasons);
            let next = if section == SectionId::Preview {
                self.repair_preview(&current, section_reasons)
            } else {
                self.repair_section(&current, section, section_reasons)?
            };
            if next.render() == current.render() {
                tracing::debug!(%section, "section left unchanged");
                unchanged.push(section);
            } else {
                tracing::info!(%section, mode = ?self.mode, "section rewritten");
                changed.push(section);
                current = next;
            }
        }

        Ok(RepairOutcome {
            document: current,
            changed,
            unchanged,
        })
    }

    fn repair_preview(&self, doc: &Document, reasons: &[String]) -> Document {
        let locked = self.rules.is_locked(doc);
        let patch = match self.generator_for(SectionId::Preview) {
            None => PreviewPatch {
                preview_line: templates::preview_line(&self.rules, locked),
                pass_condition: None,
                unlock_rule: None,
            },
            Some(generator) => {
                let request = self.request(doc, SectionId::Preview, None, reasons, locked);
                match self
                    .backoff
                    .run("preview", |_| preview_patch(&generator.generate(&request)?))
                {
                    Ok(patch) => patch,
                    Err(err) => {
                        tracing::warn!(error = %err, "preview repair dropped");
                        return doc.clone();
                    }
                }
            }
        };
        self.apply_preview(doc, patch, locked)
    }

    fn apply_preview(&self, doc: &Document, patch: PreviewPatch, locked: bool) -> Document {
        let keys = &self.rules.conditions;
        let mut out = doc.clone();

        let preview_ok = PreviewGate.check(doc, &self.rules).passed;
        if !preview_ok || self.mode == RepairMode::Generative {
            out = out.replace_preview_line(&patch.preview_line);
        }

        let conditions = ConditionsGate.check(&out, &self.rules);
        let codes: Vec<ReasonCode> = conditions.reason_codes().collect();
        if let Some(pass) = patch.pass_condition {
            out = out.set_declaration(&keys.pass_condition_key, &pass);
        } else if codes.contains(&ReasonCode::MissingPassCondition) {
            out = out.set_declaration(&keys.pass_condition_key, DEFAULT_PASS_CONDITION);
        }
        if locked {
            if let Some(rule) = patch.unlock_rule {
                out = out.set_declaration(&keys.unlock_rule_key, &rule);
            } else if codes.contains(&ReasonCode::LockedMissingUnlockRule) {
                out = out.set_declaration(&keys.unlock_rule_key, DEFAULT_UNLOCK_RULE);
            }
        }
        out
    }

    fn repair_section(
        &self,
        doc: &Document,
        section: SectionId,
        reasons: &[String],
    ) -> Result<Document, RepairError> {
        let title = self
            .rules
            .heading(section)
            .ok_or(RepairError::MissingHeading(section))?;
        let heading = somatic_doc::heading_key(title);
        let locked = self.rules.is_locked(doc);

        let block = match self.generator_for(section) {
            None => templates::section_block(&self.rules, section, locked)
                .ok_or(RepairError::MissingHeading(section))?,
            Some(generator) => {
                let current = doc.section(&heading).map(|s| s.block());
                let request = self.request(doc, section, current, reasons, locked);
                let label = section.as_str();
                match self
                    .backoff
                    .run(label, |_| section_markdown(&generator.generate(&request)?))
                {
                    Ok(block) => block,
                    Err(err) => {
                        tracing::warn!(%section, error = %err, "section repair dropped");
                        return Ok(doc.clone());
                    }
                }
            }
        };

        let edited = if doc.has_section(&heading) {
            doc.replace_section(&heading, &block)
        } else {
            doc.append_section(&heading, &block)
        };
        match edited {
            Ok(next) => Ok(next),
            Err(err @ DocumentError::ForeignHeading { .. })
                if self.mode == RepairMode::Generative =>
            {
                tracing::warn!(%section, error = %err, "generated block rejected");
                Ok(doc.clone())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// The generator to use for `section`, or `None` for a template.
    fn generator_for(&self, section: SectionId) -> Option<&Arc<dyn Generator>> {
        if self.mode == RepairMode::RuleBased {
            return None;
        }
        if section == SectionId::SystemClaim
            && self.claim_policy == SystemClaimPolicy::Boilerplate
        {
            return None;
        }
        self.generator.as_ref()
    }

    fn request(
        &self,
        doc: &Document,
        section: SectionId,
        current_block: Option<&str>,
        reasons: &[String],
        locked: bool,
    ) -> GenerationRequest {
        let document = doc.render();
        let heading = self
            .rules
            .heading(section)
            .map(somatic_doc::heading_key);
        let prompt = section_prompt(
            &SectionPromptInput {
                section,
                heading: heading.as_deref(),
                current_block,
                reasons,
                locked,
                document: &document,
            },
            &self.rules,
        );
        GenerationRequest {
            section,
            heading,
            current_block: current_block.map(str::to_string),
            reasons: reasons.to_vec(),
            locked,
            document,
            prompt,
        }
    }
}
