use crate::cli::ModeArg;
use crate::support::{
    fail, load_config_or_exit, locked_hint, pipeline_or_exit, read_text_or_exit,
    to_json_or_exit, write_text_or_exit,
};
use somatic_pipeline::{FinalStatus, PipelineOutcome};
use somatic_sheet::{
    AppendOutcome, DEFAULT_WINDOW, JsonFileStore, RUN_LEDGER, RowStore, append_idempotent,
    content_key, timestamp,
};
use std::path::Path;

pub struct Args {
    pub draft: String,
    pub out: String,
    pub workdir: Option<String>,
    pub mode: Option<ModeArg>,
    pub ledger: Option<String>,
    pub locked: bool,
    pub unlocked: bool,
    pub config: Option<String>,
}

/// Exit 0 when the card ends passing, 1 on `FAIL_AFTER_REWRITE`.
pub fn run(args: Args) {
    let config = load_config_or_exit(args.config.as_deref(), args.mode);
    let pipeline = pipeline_or_exit(&config);
    let text = read_text_or_exit(&args.draft);

    let outcome = pipeline
        .run(&text, locked_hint(args.locked, args.unlocked))
        .unwrap_or_else(|e| fail(e));

    if let Some(workdir) = &args.workdir {
        write_attempts(Path::new(workdir), &outcome);
    }
    write_text_or_exit(&args.out, outcome.final_document());

    if outcome.final_status == FinalStatus::Pass {
        println!("GATES: PASS");
    } else {
        println!("GATES: FAIL -> RETRY");
        println!("GATES: {}", outcome.final_status);
    }

    if let Some(ledger) = &args.ledger {
        record_run(Path::new(ledger), &args.draft, &outcome);
    }

    std::process::exit(if outcome.final_status.is_pass() { 0 } else { 1 });
}

fn write_attempts(workdir: &Path, outcome: &PipelineOutcome) {
    for (idx, (document, report)) in outcome.documents.iter().zip(&outcome.reports).enumerate() {
        let attempt = idx + 1;
        write_text_or_exit(workdir.join(format!("attempt{attempt}.md")), document);
        let wire = to_json_or_exit(&report.to_wire());
        write_text_or_exit(
            workdir.join(format!("validation_attempt{attempt}.json")),
            &format!("{wire}\n"),
        );
    }
}

/// One ledger row per distinct (draft, final document) pair.
fn record_run(ledger: &Path, draft: &str, outcome: &PipelineOutcome) {
    let store = JsonFileStore::new(ledger);
    store
        .ensure_tab(RUN_LEDGER.name, RUN_LEDGER.headers)
        .unwrap_or_else(|e| fail(e));

    let key = content_key(&outcome.documents[0], outcome.final_document());
    let failed_gates = outcome
        .final_report()
        .map(|r| {
            r.failed_gates()
                .iter()
                .map(|g| g.as_str())
                .collect::<Vec<_>>()
                .join(",")
        })
        .unwrap_or_default();
    let row = vec![
        timestamp(),
        key.clone(),
        outcome.run_id.clone(),
        draft.to_string(),
        outcome.final_status.to_string(),
        outcome.attempt_count.to_string(),
        failed_gates,
    ];
    let key_col = RUN_LEDGER.column("IdemKey").unwrap_or(1);
    match append_idempotent(&store, RUN_LEDGER.name, row, key_col, DEFAULT_WINDOW) {
        Ok(AppendOutcome::Appended(row)) => println!("LEDGER: APPENDED {key} (row {row})"),
        Ok(AppendOutcome::Duplicate(row)) => println!("LEDGER: DUPLICATE {key} (row {row})"),
        Err(e) => fail(e),
    }
}
