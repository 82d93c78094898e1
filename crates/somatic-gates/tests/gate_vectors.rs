//! Integration tests: run the gate engine over markdown fixtures.
//!
//! Each fixture in tests/fixtures/ has:
//! - card.md: the checklist document
//! - expect.json: the expected wire report
//!
//! The wire report is compared as JSON, so key order in expect.json does
//! not matter.

use serde_json::Value;
use somatic_doc::Document;
use somatic_gates::{GateEngine, ReasonCode, RuleSet, SectionId, Status};
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_card(name: &str) -> String {
    let path = fixtures_dir().join(name).join("card.md");
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()))
}

fn run_fixture(name: &str) {
    let expect_path = fixtures_dir().join(name).join("expect.json");
    let expect_str = std::fs::read_to_string(&expect_path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", expect_path.display()));
    let expected: Value = serde_json::from_str(&expect_str)
        .unwrap_or_else(|e| panic!("failed to parse {}: {e}", expect_path.display()));

    let report = GateEngine::default().validate(&Document::parse(&load_card(name)), 1);
    let got = serde_json::to_value(report.to_wire()).expect("failed to serialize report");

    assert_eq!(
        got,
        expected,
        "\n\nFixture: {name}\n\nGot:\n{}\n\nExpected:\n{}\n",
        serde_json::to_string_pretty(&got).expect("pretty"),
        serde_json::to_string_pretty(&expected).expect("pretty"),
    );
}

#[test]
fn golden_complete_card() {
    run_fixture("complete_card");
}

#[test]
fn missing_faq() {
    run_fixture("missing_faq");
}

#[test]
fn locked_without_unlock_rule() {
    run_fixture("locked_without_unlock_rule");
}

#[test]
fn definitions_three_rows() {
    run_fixture("definitions_three_rows");
}

#[test]
fn preview_forbidden_word() {
    run_fixture("preview_forbidden_word");
}

#[test]
fn missing_faq_targets_faq_once() {
    let report = GateEngine::default().validate(&Document::parse(&load_card("missing_faq")), 1);
    assert_eq!(report.status, Status::Fail);
    assert_eq!(
        report.failed_reason_codes,
        vec![ReasonCode::Missing(SectionId::Faq), ReasonCode::FaqLt3]
    );
    assert_eq!(report.rewrite_targets, vec![SectionId::Faq]);
    assert_eq!(report.metrics["faq_pairs"], 0);
}

#[test]
fn three_definition_rows_are_reported_in_metrics() {
    let report =
        GateEngine::default().validate(&Document::parse(&load_card("definitions_three_rows")), 1);
    assert_eq!(report.metrics["definitions_rows"], 3);
    assert_eq!(report.rewrite_targets, vec![SectionId::Definitions]);
}

#[test]
fn stored_wire_report_round_trips_to_the_same_targets() {
    let report = GateEngine::default().validate(&Document::parse(&load_card("missing_faq")), 1);
    let wire = report.to_wire();
    let json = wire.to_json_pretty().expect("serialize");
    let back = somatic_gates::WireReport::from_json_str(&json).expect("parse");
    assert_eq!(back.rewrite_targets().expect("targets"), report.rewrite_targets);
}

#[test]
fn substituted_rules_do_not_leak_between_engines() {
    let card = Document::parse(&load_card("complete_card"));
    let mut strict = RuleSet::default();
    strict.faq.min_pairs = 5;

    let strict_report = GateEngine::standard(strict).validate(&card, 1);
    let default_report = GateEngine::default().validate(&card, 1);

    assert_eq!(strict_report.failed_reason_codes, vec![ReasonCode::FaqLt3]);
    assert_eq!(default_report.status, Status::Pass);
}

#[test]
fn wire_report_shape_is_stable() {
    let report = GateEngine::default().validate(&Document::parse(&load_card("missing_faq")), 1);
    insta::assert_json_snapshot!(report.to_wire(), @r###"
    {
      "status": "FAIL",
      "failed_gates": [
        "structure",
        "faq"
      ],
      "failed_sections": [
        "FAQ"
      ],
      "reasons": {
        "faq": [
          "FAQ_LT_3: FAQ needs at least 3 question/answer pairs, found 0."
        ],
        "structure": [
          "MISSING_FAQ: Missing heading: ## FAQ"
        ]
      }
    }
    "###);
}
