//! Prompt text for section rewrites and for drafting a new card.

use somatic_gates::{RuleSet, SectionId};
use std::fmt::Write as _;

/// Rules every generated card must follow.
pub const SEALED_RULESET: &str = "\
[SEALED RULESET v1 — Checklist Writing Engine]
R1) Preview 1-liner must be exactly ONE line and must be \"상태→효과\" only.
    - Must include a measurable state (count/score/pass condition)
    - Must include exactly ONE effect (result)
    - Forbidden: explanation/why/how/tips/story/marketing fluff
R2) Every post MUST include these blocks: Definitions + Procedure + FAQ(>=3).
R3) Every post MUST declare Pass Condition.
    If locked=true, MUST also output Unlock Rule as exactly ONE line.
R4) Stats widget: aggregate by card_id only, anonymous. No user ids, no free-text comments stored.
";

const WRITER_INSTRUCTIONS: &str = "\
[WRITER INSTRUCTIONS]
- Language: Korean
- Tone: compact, directive, no explanations.
- Do NOT add any extra sections outside the skeleton.
- Do NOT change headings, ordering, or required blocks.
- All checks must be phrased as questions.
- Action must include explicit time or count (e.g., 60s, 20회).
- FAQ must be >= 3, and answers must be short, operational.

[LOCKING RULE]
- If locked=true: preview must start with \"🔒\"
- If locked=false: preview must start with \"✅\"

[STATS WIDGET RULE — Do not implement tracking code, only text description]
- Mention that stats are aggregated by card_id only, anonymous.
";

/// Inputs for one section rewrite prompt.
#[derive(Debug, Clone, Copy)]
pub struct SectionPromptInput<'a> {
    pub section: SectionId,
    pub heading: Option<&'a str>,
    pub current_block: Option<&'a str>,
    pub reasons: &'a [String],
    pub locked: bool,
    pub document: &'a str,
}

/// Prompt asking for a JSON rewrite of exactly one section.
pub fn section_prompt(input: &SectionPromptInput<'_>, rules: &RuleSet) -> String {
    let mut out = String::new();
    out.push_str(SEALED_RULESET);
    out.push('\n');
    let _ = writeln!(out, "[TASK] Rewrite ONLY the section `{}`.", input.section);
    let _ = writeln!(out, "locked: {}", input.locked);

    out.push_str("\n[FAILED CHECKS]\n");
    if input.reasons.is_empty() {
        out.push_str("- (section missing or incomplete)\n");
    }
    for reason in input.reasons {
        let _ = writeln!(out, "- {reason}");
    }

    out.push_str("\n[OUTPUT FORMAT]\n");
    match input.heading {
        None => {
            let glyph = if input.locked {
                &rules.preview.locked_glyph
            } else {
                &rules.preview.unlocked_glyph
            };
            let _ = writeln!(
                out,
                "Return a JSON object: {{\"preview_line\": \"...\", \"pass_condition\": \"...\", \"unlock_rule\": \"...\"}}.\n\
                 preview_line must be ONE line starting with {glyph}, with a digit or one of: {}.\n\
                 Never use: {}.",
                rules.preview.measurable_words.join(", "),
                rules.preview.forbidden_words.join(", "),
            );
            if !input.locked {
                out.push_str("unlock_rule may be omitted.\n");
            }
        }
        Some(heading) => {
            let _ = writeln!(
                out,
                "Return a JSON object: {{\"section_markdown\": \"...\"}}.\n\
                 section_markdown must start with the line `{heading}` and contain no other `## ` heading."
            );
            section_requirements(&mut out, input.section, rules);
        }
    }

    if let Some(block) = input.current_block {
        let _ = write!(out, "\n[CURRENT SECTION]\n{}\n", block.trim_end());
    }
    let _ = write!(out, "\n[FULL DOCUMENT — context only]\n{}\n", input.document.trim_end());
    out
}

fn section_requirements(out: &mut String, section: SectionId, rules: &RuleSet) {
    let line = match section {
        SectionId::Definitions => {
            let [left, right] = rules
                .definitions
                .header_pairs
                .first()
                .cloned()
                .unwrap_or_else(|| ["Term".to_string(), "Definition".to_string()]);
            format!(
                "Use a 2-column table with header `| {left} | {right} |` and at least {} rows.",
                rules.definitions.min_rows
            )
        }
        SectionId::Procedure => format!(
            "Use at least {} numbered steps (`1.`).",
            rules.procedure.min_steps
        ),
        SectionId::Faq => format!(
            "Use at least {} pairs of `**Qn. question**` followed by `An. answer`.",
            rules.faq.min_pairs
        ),
        SectionId::SystemClaim => format!(
            "Mention all of: {}.",
            rules.claim.required_phrases.join(", ")
        ),
        SectionId::Evidence => format!(
            "Mention {}, {}; never mention {}.",
            rules.stats.key_term,
            rules.stats.anonymity_terms.join(" + "),
            rules.stats.forbidden_terms.join(", ")
        ),
        SectionId::RoutineCard => "List 5 checks phrased as questions.".to_string(),
        SectionId::Action => "Give 1-3 actions with an explicit time or count.".to_string(),
        SectionId::ReCheck => "List 5 re-check questions.".to_string(),
        SectionId::Preview => return,
    };
    out.push_str(&line);
    out.push('\n');
}

/// Inputs for drafting a whole new card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterBrief {
    pub title: String,
    pub card_id: String,
    pub locked: bool,
    pub pass_condition: String,
    pub unlock_rule: String,
    pub notes: String,
    /// ISO date shown in the prompt header.
    pub date: String,
}

/// The sealed writer prompt with the template skeleton filled in.
pub fn writer_prompt(brief: &WriterBrief, rules: &RuleSet) -> String {
    let unlock_block = if brief.locked {
        format!("**{}:** {}\n", rules.conditions.unlock_rule_key, brief.unlock_rule)
    } else {
        String::new()
    };
    let h = &rules.headings;
    let skeleton = format!(
        "# {title}\n\n\
         {{PREVIEW_1LINER}}  <!-- 상태→효과 only -->\n\n\
         **{pass_key}:** {pass}\n{unlock_block}\n\
         ---\n\n\
         ## {routine}\n- Check 1 (질문 1)\n- Check 2\n- Check 3\n- Check 4\n- Check 5\n\n\
         ## {action}\n- {{time/count 기반 액션 1~3줄}}\n\n\
         ## {recheck}\n- Re-check 1\n- Re-check 2\n- Re-check 3\n- Re-check 4\n- Re-check 5\n\n\
         ## {evidence}\n- 기록 방식: score 0~5, pass true/false, card_id\n\n\
         ---\n\n\
         ## {definitions}\n| Term | Definition |\n| :--- | :--- |\n| Routine Card | ... |\n| Pass Condition | ... |\n| {{key term}} | ... |\n\n\
         ## {procedure}\n1. ...\n2. ...\n3. ...\n4. ...\n\n\
         ## {faq}\n**Q1. 실패하면 어떻게 하나요?**  \nA1. ...\n\n**Q2. 통증/불편하면요?**  \nA2. ...\n\n**Q3. 빈도/주간 루틴은요?**  \nA3. ...\n\n\
         ## {claim}\n- {{routine card / system / card_id / pass/fail / index}}\n",
        title = brief.title,
        pass_key = rules.conditions.pass_condition_key,
        pass = brief.pass_condition,
        routine = h.routine_card,
        action = h.action,
        recheck = h.re_check,
        evidence = h.evidence,
        definitions = h.definitions,
        procedure = h.procedure,
        faq = h.faq,
        claim = h.system_claim,
    );
    let glyph = if brief.locked {
        &rules.preview.locked_glyph
    } else {
        &rules.preview.unlocked_glyph
    };
    let notes = if brief.notes.trim().is_empty() {
        "(none)"
    } else {
        brief.notes.trim()
    };

    let mut out = String::new();
    let _ = writeln!(out, "You are writing a Checklist post under SEALED RULESET v1.");
    let _ = writeln!(out, "Today: {}", brief.date);
    let _ = writeln!(out, "card_id: {}", brief.card_id);
    let _ = writeln!(out, "locked: {}\n", brief.locked);
    out.push_str(SEALED_RULESET);
    out.push_str("\n[INPUT CONTEXT]\n");
    let _ = writeln!(out, "- Title: {}", brief.title);
    let _ = writeln!(out, "- Pass Condition: {}", brief.pass_condition);
    let _ = writeln!(out, "- Unlock Rule (if locked): {}", brief.unlock_rule);
    let _ = writeln!(out, "- Optional notes: {notes}\n");
    out.push_str("[TEMPLATE SKELETON v1 — fill the placeholders]\n");
    out.push_str(&skeleton);
    out.push('\n');
    out.push_str(WRITER_INSTRUCTIONS);
    out.push_str("\n[CRITICAL]\n");
    out.push_str("- PREVIEW_1LINER must be exactly ONE LINE and must be \"상태→효과\" only.\n");
    let _ = writeln!(out, "- PREVIEW_1LINER must start with {glyph}");
    out.push_str("- No extra commentary. Output only the final Markdown.\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brief(locked: bool) -> WriterBrief {
        WriterBrief {
            title: "허리 리셋".to_string(),
            card_id: "back-reset-01".to_string(),
            locked,
            pass_condition: "체크 5개 중 4개 이상 통과".to_string(),
            unlock_rule: "최근 7일 평균 4.2/5 이상 + 3일 연속 통과".to_string(),
            notes: String::new(),
            date: "2026-10-18".to_string(),
        }
    }

    #[test]
    fn writer_prompt_carries_unlock_rule_only_when_locked() {
        let rules = RuleSet::default();
        let locked = writer_prompt(&brief(true), &rules);
        assert!(locked.contains("**Unlock Rule:** 최근 7일"));
        assert!(locked.contains("must start with 🔒"));
        assert!(locked.contains("card_id: back-reset-01"));

        let open = writer_prompt(&brief(false), &rules);
        assert!(!open.contains("**Unlock Rule:**"));
        assert!(open.contains("must start with ✅"));
        assert!(open.contains("## Evidence (Optional but recommended)"));
    }

    #[test]
    fn section_prompt_names_the_output_shape() {
        let rules = RuleSet::default();
        let reasons = vec!["FAQ_LT_3: found 1.".to_string()];
        let prompt = section_prompt(
            &SectionPromptInput {
                section: SectionId::Faq,
                heading: Some("## FAQ"),
                current_block: Some("## FAQ\n**Q1. a?**\nA1. b\n"),
                reasons: &reasons,
                locked: false,
                document: "# T\n",
            },
            &rules,
        );
        assert!(prompt.contains("section_markdown"));
        assert!(prompt.contains("- FAQ_LT_3: found 1."));
        assert!(prompt.contains("at least 3 pairs"));

        let preview = section_prompt(
            &SectionPromptInput {
                section: SectionId::Preview,
                heading: None,
                current_block: None,
                reasons: &[],
                locked: true,
                document: "# T\n",
            },
            &rules,
        );
        assert!(preview.contains("preview_line"));
        assert!(preview.contains("starting with 🔒"));
    }
}
