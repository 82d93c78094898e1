//! End-to-end runs of the two-attempt pipeline and the batch runner.

use somatic_gates::{GateEngine, RuleSet, SectionId, Status};
use somatic_pipeline::{BatchMode, FinalStatus, Pipeline, collect_markdown, run_batch};
use somatic_repair::{Backoff, GenerationError, GenerationRequest, Repairer, RetryPolicy};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const COMPLETE: &str = include_str!("fixtures/complete_card.md");
const BROKEN: &str = include_str!("fixtures/broken_card.md");

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "somatic-pipeline-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn rule_based() -> Pipeline {
    let rules = RuleSet::default();
    Pipeline::new(
        GateEngine::standard(rules.clone()),
        Repairer::rule_based(rules),
    )
}

#[test]
fn passing_card_stops_after_one_attempt() {
    let outcome = rule_based().run(COMPLETE, None).expect("run");
    assert_eq!(outcome.final_status, FinalStatus::Pass);
    assert_eq!(outcome.attempt_count, 1);
    assert_eq!(outcome.reports.len(), 1);
    assert!(outcome.repair.is_none());
    assert_eq!(outcome.final_document(), COMPLETE);
}

#[test]
fn broken_card_passes_after_one_rewrite() {
    let outcome = rule_based().run(BROKEN, None).expect("run");
    let second = outcome.final_report().expect("second report");
    assert_eq!(
        outcome.final_status,
        FinalStatus::PassAfterRewrite,
        "{:?}\n{}",
        second.failed_reason_codes,
        outcome.final_document()
    );
    assert_eq!(outcome.attempt_count, 2);
    assert_eq!(outcome.reports[0].attempt, 1);
    assert_eq!(second.attempt, 2);
    assert_eq!(outcome.documents[0], BROKEN);

    let summary = outcome.repair.expect("repair summary");
    assert!(summary.changed.contains(&SectionId::Procedure));
    assert!(summary.changed.contains(&SectionId::Faq));
    assert!(!summary.changed.contains(&SectionId::RoutineCard));
}

#[test]
fn failing_generator_ends_in_fail_after_rewrite() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let generator = move |_request: &GenerationRequest| {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(GenerationError::Transient("upstream unavailable".to_string()))
    };
    let rules = RuleSet::default();
    let pipeline = Pipeline::new(
        GateEngine::standard(rules.clone()),
        Repairer::generative(
            rules,
            Arc::new(generator),
            Backoff::new(RetryPolicy::immediate(2)),
        ),
    );

    let outcome = pipeline.run(BROKEN, None).expect("run");
    assert_eq!(outcome.final_status, FinalStatus::FailAfterRewrite);
    assert_eq!(outcome.attempt_count, 2);
    assert_eq!(outcome.documents[0], BROKEN);
    assert!(outcome.final_document().starts_with(BROKEN));
    assert!(outcome.final_document().contains("## System Claim"));
    assert_eq!(
        outcome.final_report().map(|r| r.status),
        Some(Status::Fail)
    );
    // System Claim comes from the boilerplate; every other target used two tries.
    let summary = outcome.repair.expect("repair summary");
    assert_eq!(summary.changed, vec![SectionId::SystemClaim]);
    assert_eq!(calls.load(Ordering::SeqCst), 2 * summary.unchanged.len());
}

#[test]
fn locked_hint_demands_an_unlock_rule() {
    let pipeline = rule_based();
    let report = pipeline.validate(COMPLETE, Some(true));
    assert_eq!(report.status, Status::Fail);

    let outcome = pipeline.run(COMPLETE, Some(true)).expect("run");
    assert_eq!(outcome.final_status, FinalStatus::PassAfterRewrite);
    assert!(outcome.final_document().contains("**Unlock Rule:**"));
}

fn with_unlock_lines(extra: &str) -> String {
    let anchor = "**Pass Condition:** 체크 5개 중 4개 이상 통과\n";
    assert!(COMPLETE.contains(anchor));
    COMPLETE.replacen(anchor, &format!("{anchor}{extra}"), 1)
}

#[test]
fn spilled_unlock_rule_is_rewritten_onto_one_line() {
    let draft = with_unlock_lines("**Unlock Rule:** 3일 연속\n그리고 평균 4점\n");
    let outcome = rule_based().run(&draft, Some(true)).expect("run");
    assert_eq!(
        outcome.final_status,
        FinalStatus::PassAfterRewrite,
        "{:?}",
        outcome.final_report().map(|r| &r.failed_reason_codes)
    );
    assert!(!outcome.final_document().contains("그리고 평균 4점"));
    assert_eq!(outcome.final_document().matches("**Unlock Rule:**").count(), 1);
}

#[test]
fn duplicate_unlock_rule_is_collapsed() {
    let draft = with_unlock_lines("**Unlock Rule:** 3일 연속\n**Unlock Rule:** 7일 평균\n");
    let outcome = rule_based().run(&draft, Some(true)).expect("run");
    assert_eq!(
        outcome.final_status,
        FinalStatus::PassAfterRewrite,
        "{:?}",
        outcome.final_report().map(|r| &r.failed_reason_codes)
    );
    assert_eq!(outcome.final_document().matches("**Unlock Rule:**").count(), 1);
}

#[test]
fn run_ids_are_unique() {
    let pipeline = rule_based();
    let a = pipeline.run(COMPLETE, None).expect("run");
    let b = pipeline.run(COMPLETE, None).expect("run");
    assert_ne!(a.run_id, b.run_id);
}

#[test]
fn batch_continues_past_an_unreadable_card() {
    let dir = TempDirGuard::new("batch");
    let nested = dir.path().join("nested");
    fs::create_dir_all(&nested).expect("nested dir");
    fs::write(dir.path().join("a_complete.md"), COMPLETE).expect("write");
    fs::write(nested.join("b_broken.md"), BROKEN).expect("write");
    fs::write(dir.path().join("c_binary.md"), [0xff, 0xfe, 0x00, 0x80]).expect("write");
    fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

    let listing = collect_markdown(dir.path()).expect("collect");
    assert_eq!(listing.paths.len(), 3);
    assert!(listing.paths.windows(2).all(|w| w[0] <= w[1]));
    assert!(listing.unreadable.is_empty());

    let summary = run_batch(&rule_based(), &listing, BatchMode::Pipeline);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.errors(), 1);
    assert_eq!(summary.by_status.get("PASS"), Some(&1));
    assert_eq!(summary.by_status.get("PASS_AFTER_REWRITE"), Some(&1));
    assert!(!summary.all_passed());

    let broken = summary
        .items
        .iter()
        .find(|item| item.path.ends_with("b_broken.md"))
        .expect("broken item");
    assert!(broken.final_document.is_some());

    let binary = summary
        .items
        .iter()
        .find(|item| item.path.ends_with("c_binary.md"))
        .expect("binary item");
    assert_eq!(binary.status, "ERROR");
    assert!(binary.error.as_deref().is_some_and(|e| e.contains("c_binary.md")));
}

#[test]
fn validate_only_batch_does_not_repair() {
    let dir = TempDirGuard::new("validate");
    fs::write(dir.path().join("broken.md"), BROKEN).expect("write");

    let listing = collect_markdown(dir.path()).expect("collect");
    let summary = run_batch(&rule_based(), &listing, BatchMode::ValidateOnly);
    assert_eq!(summary.by_status.get("FAIL"), Some(&1));
    let item = &summary.items[0];
    assert!(item.final_document.is_none());
    let report = item.report.as_ref().expect("report");
    assert!(report.failed_sections.contains(&SectionId::Faq));
}

#[cfg(unix)]
#[test]
fn batch_skips_symlinked_directory_loops() {
    let dir = TempDirGuard::new("loop");
    let nested = dir.path().join("nested");
    fs::create_dir_all(&nested).expect("nested dir");
    fs::write(nested.join("card.md"), COMPLETE).expect("write");
    std::os::unix::fs::symlink(dir.path(), nested.join("back")).expect("symlink");

    let listing = collect_markdown(dir.path()).expect("collect");
    assert_eq!(listing.paths, vec![nested.join("card.md")]);
    assert!(listing.unreadable.is_empty());
}

#[cfg(unix)]
#[test]
fn unreadable_subdirectory_becomes_an_error_item() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDirGuard::new("unreadable");
    fs::write(dir.path().join("a_complete.md"), COMPLETE).expect("write");
    let locked = dir.path().join("locked");
    fs::create_dir_all(&locked).expect("locked dir");
    fs::write(locked.join("hidden.md"), COMPLETE).expect("write");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).expect("chmod");
    if fs::read_dir(&locked).is_ok() {
        // Permission bits do not bind this user (root); nothing to observe.
        let _ = fs::set_permissions(&locked, fs::Permissions::from_mode(0o755));
        return;
    }

    let listing = collect_markdown(dir.path()).expect("collect");
    let summary = run_batch(&rule_based(), &listing, BatchMode::ValidateOnly);
    let _ = fs::set_permissions(&locked, fs::Permissions::from_mode(0o755));

    assert_eq!(summary.total, 2);
    assert_eq!(summary.by_status.get("PASS"), Some(&1));
    assert_eq!(summary.errors(), 1);
    let item = summary
        .items
        .iter()
        .find(|item| item.path == locked)
        .expect("locked item");
    assert!(item.error.as_deref().is_some_and(|e| e.contains("locked")));
}
