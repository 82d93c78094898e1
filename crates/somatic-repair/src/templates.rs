//! Fixed replacement text for rule-based repair.
//!
//! Every template is built against the active [`RuleSet`] so that the block
//! it produces passes the gate that flagged it.

use somatic_gates::{RuleSet, SectionId};
use std::fmt::Write as _;

pub const DEFAULT_PASS_CONDITION: &str = "체크 5개 중 4개 이상 통과";
pub const DEFAULT_UNLOCK_RULE: &str = "최근 7일 평균 4.2/5 이상 + 3일 연속 통과";

/// Replacement preview one-liner for the given lock state.
pub fn preview_line(rules: &RuleSet, locked: bool) -> String {
    if locked {
        format!("{} {DEFAULT_UNLOCK_RULE} → 잠금 해제", rules.preview.locked_glyph)
    } else {
        format!("{} 5문항 중 4개 이상 통과 → 루틴 유지", rules.preview.unlocked_glyph)
    }
}

/// Replacement block (heading line included) for a heading section.
/// `None` for the preview block, which is not a heading section.
pub fn section_block(rules: &RuleSet, section: SectionId, locked: bool) -> Option<String> {
    let heading = rules.heading(section)?;
    let body = match section {
        SectionId::Preview => return None,
        SectionId::Definitions => definitions(rules, locked),
        SectionId::Procedure => procedure(rules),
        SectionId::Faq => faq(rules),
        SectionId::SystemClaim => system_claim(rules),
        SectionId::Evidence => evidence(rules),
        SectionId::RoutineCard => ROUTINE_CARD.to_string(),
        SectionId::Action => ACTION.to_string(),
        SectionId::ReCheck => RE_CHECK.to_string(),
    };
    Some(format!("## {heading}\n{body}"))
}

const ROUTINE_CARD: &str = "\
- [ ] 오늘 동작을 끝까지 했나요?
- [ ] 통증 없이 범위를 유지했나요?
- [ ] 호흡을 멈추지 않았나요?
- [ ] 정해진 시간을 지켰나요?
- [ ] 끝난 뒤 몸이 편안한가요?
";

const ACTION: &str = "\
- 60초 동안 천천히 동작을 반복합니다 (10회).
";

const RE_CHECK: &str = "\
- 동작 직후 5문항을 다시 체크했나요?
- 점수가 처음보다 올랐나요?
- 불편한 부위가 줄었나요?
- 호흡이 안정됐나요?
- 내일도 같은 시간에 할 수 있나요?
";

fn definitions(rules: &RuleSet, locked: bool) -> String {
    let [left, right] = rules
        .definitions
        .header_pairs
        .first()
        .cloned()
        .unwrap_or_else(|| ["Term".to_string(), "Definition".to_string()]);
    let mut rows = vec![
        ("Routine Card".to_string(), "5개 체크 질문 묶음(0~5점).".to_string()),
        (
            rules.conditions.pass_condition_key.clone(),
            format!("{DEFAULT_PASS_CONDITION}."),
        ),
        (
            rules.stats.key_term.clone(),
            "익명 집계용 고정 식별자(개인정보 없음).".to_string(),
        ),
    ];
    if locked {
        rows.push((
            rules.conditions.unlock_rule_key.clone(),
            format!("{DEFAULT_UNLOCK_RULE}."),
        ));
    } else {
        rows.push((
            "Status".to_string(),
            "현재 누구나 접근 가능한 공개 카드입니다.".to_string(),
        ));
    }
    let mut extra = 1;
    while rows.len() < rules.definitions.min_rows {
        rows.push((format!("Note {extra}"), "카드 보조 정의.".to_string()));
        extra += 1;
    }

    let mut out = format!("| {left} | {right} |\n| :--- | :--- |\n");
    for (term, definition) in rows {
        let _ = writeln!(out, "| **{term}** | {definition} |");
    }
    out
}

fn procedure(rules: &RuleSet) -> String {
    let mut steps = vec![
        "**Preparation**: 자리를 정리하고 자세를 잡습니다 (0s).",
        "**Execution**: 핵심 동작을 수행합니다 (30-60s).",
        "**Verification**: 통과 조건과 비교합니다 (10s).",
        "**Recording**: 결과를 바로 기록합니다 (5s).",
    ];
    while steps.len() < rules.procedure.min_steps {
        steps.push("**Repeat**: 같은 동작을 한 번 더 확인합니다 (10s).");
    }
    let mut out = String::new();
    for (i, step) in steps.iter().enumerate() {
        let _ = writeln!(out, "{}. {step}", i + 1);
    }
    out
}

fn faq(rules: &RuleSet) -> String {
    let mut pairs = vec![
        (
            "실패하면 어떻게 하나요?",
            "오늘은 리셋하지 말고 Action만 1회 더 하고 종료합니다.",
        ),
        (
            "통증/불편하면요?",
            "통증이 있으면 즉시 중단하고, 범위를 50%로 줄여 재측정합니다.",
        ),
        (
            "빈도/주간 루틴은요?",
            "주 3회만 기록합니다. 연속 2회 FAIL이면 난이도를 한 단계 낮춥니다.",
        ),
    ];
    while pairs.len() < rules.faq.min_pairs {
        pairs.push(("기록을 빠뜨리면요?", "다음 회차부터 다시 기록합니다."));
    }
    let mut out = String::new();
    for (i, (question, answer)) in pairs.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let n = i + 1;
        let _ = writeln!(out, "**Q{n}. {question}**  ");
        let _ = writeln!(out, "A{n}. {answer}");
    }
    out
}

fn system_claim(rules: &RuleSet) -> String {
    let mut out = String::from(
        "This page is a Routine Card in the Somatic Checklist Writing System.\n\
         - **card_id**: stable anonymous key for every card.\n\
         - **Pass/Fail**: binary outcome of each check-in.\n\
         - **Card → Weekly Routine → Monthly Diagnosis**: hierarchy of units.\n\
         - The authoritative index is /dashboard/cards.json.\n",
    );
    let lower = out.to_lowercase();
    let missing: Vec<&str> = rules
        .claim
        .required_phrases
        .iter()
        .map(String::as_str)
        .filter(|phrase| !lower.contains(&phrase.to_lowercase()))
        .collect();
    if !missing.is_empty() {
        let _ = writeln!(out, "- References: {}.", missing.join(", "));
    }
    out
}

fn evidence(rules: &RuleSet) -> String {
    let stats = &rules.stats;
    format!(
        "- 기록: {key} 기준으로만 {terms}합니다.\n\
         - 필드: date, score(0~5), pass(true/false), {key}\n\
         - 위젯: 오늘 통과율 + n / 가장 많이 막힌 체크 Top1 / 주간 평균 점수\n",
        key = stats.key_term,
        terms = stats.anonymity_terms.join(" "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use somatic_doc::Document;
    use somatic_gates::checks::{AuthorityGate, DefinitionsGate, FaqGate, PreviewGate, ProcedureGate};
    use somatic_gates::Gate;

    fn doc_with(section: SectionId, rules: &RuleSet) -> Document {
        let block = section_block(rules, section, false).expect("heading section");
        Document::parse(&format!("# 카드\n\n✅ 4개 이상 통과\n\n{block}"))
    }

    #[test]
    fn templates_pass_their_gates() {
        let rules = RuleSet::default();
        let cases: [(SectionId, &dyn Gate); 4] = [
            (SectionId::Definitions, &DefinitionsGate),
            (SectionId::Procedure, &ProcedureGate),
            (SectionId::Faq, &FaqGate),
            (SectionId::SystemClaim, &AuthorityGate),
        ];
        for (section, gate) in cases {
            let result = gate.check(&doc_with(section, &rules), &rules);
            assert!(result.passed, "{section}: {:?}", result.failures);
        }
    }

    #[test]
    fn templates_follow_stricter_rules() {
        let mut rules = RuleSet::default();
        rules.faq.min_pairs = 5;
        rules.procedure.min_steps = 6;
        rules.definitions.min_rows = 6;
        rules.claim.required_phrases.push("weekly audit".to_string());
        let cases: [(SectionId, &dyn Gate); 4] = [
            (SectionId::Definitions, &DefinitionsGate),
            (SectionId::Procedure, &ProcedureGate),
            (SectionId::Faq, &FaqGate),
            (SectionId::SystemClaim, &AuthorityGate),
        ];
        for (section, gate) in cases {
            let result = gate.check(&doc_with(section, &rules), &rules);
            assert!(result.passed, "{section}: {:?}", result.failures);
        }
    }

    #[test]
    fn evidence_template_is_anonymous_and_clean() {
        let rules = RuleSet::default();
        let block = section_block(&rules, SectionId::Evidence, false).expect("evidence");
        assert!(block.starts_with("## Evidence (Optional but recommended)\n"));
        assert!(block.contains("card_id"));
        assert!(block.contains("익명") && block.contains("집계"));
        for term in &rules.stats.forbidden_terms {
            assert!(!block.contains(term.as_str()), "{term}");
        }
    }

    #[test]
    fn preview_lines_pass_the_preview_gate() {
        let rules = RuleSet::default();
        for locked in [true, false] {
            let text = format!("# 카드\n\n{}\n", preview_line(&rules, locked));
            let result = PreviewGate.check(&Document::parse(&text), &rules);
            assert!(result.passed, "locked={locked}: {:?}", result.failures);
        }
        assert!(preview_line(&rules, true).starts_with("🔒"));
    }

    #[test]
    fn preview_is_not_a_heading_section() {
        assert_eq!(section_block(&RuleSet::default(), SectionId::Preview, true), None);
    }
}
