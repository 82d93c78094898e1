use crate::cli::ModeArg;
use crate::support::{
    fail, load_config_or_exit, locked_hint, pipeline_or_exit, print_json_or_exit,
    read_text_or_exit, write_text_or_exit,
};
use serde_json::json;
use somatic_doc::Document;
use somatic_gates::WireReport;

pub struct Args {
    pub input: String,
    pub validation: String,
    pub out: String,
    pub mode: Option<ModeArg>,
    pub locked: bool,
    pub unlocked: bool,
    pub config: Option<String>,
}

pub fn run(args: Args) {
    let config = load_config_or_exit(args.config.as_deref(), args.mode);
    let pipeline = pipeline_or_exit(&config);

    let wire = WireReport::from_json_str(&read_text_or_exit(&args.validation))
        .unwrap_or_else(|e| fail(format!("{}: {e}", args.validation)));
    let targets = wire.rewrite_targets().unwrap_or_else(|e| fail(e));
    let reasons = wire.reasons_by_section().unwrap_or_else(|e| fail(e));

    let mut doc = Document::parse(&read_text_or_exit(&args.input));
    if let Some(locked) = locked_hint(args.locked, args.unlocked) {
        doc = doc.with_locked(locked);
    }

    let outcome = pipeline
        .repairer()
        .repair(&doc, &targets, &reasons)
        .unwrap_or_else(|e| fail(e));
    write_text_or_exit(&args.out, &outcome.document.render());

    print_json_or_exit(&json!({
        "out": args.out,
        "mode": pipeline.repairer().mode(),
        "targets": targets,
        "changed": outcome.changed,
        "unchanged": outcome.unchanged,
    }));
}
