use crate::support::{
    load_config_or_exit, locked_hint, read_text_or_exit, to_json_or_exit, write_text_or_exit,
};
use somatic_doc::Document;
use somatic_gates::GateEngine;

pub struct Args {
    pub input: String,
    pub json: Option<String>,
    pub locked: bool,
    pub unlocked: bool,
    pub config: Option<String>,
}

/// Exit 0 on PASS, 1 on FAIL.
pub fn run(args: Args) {
    let config = load_config_or_exit(args.config.as_deref(), None);
    let text = read_text_or_exit(&args.input);
    let mut doc = Document::parse(&text);
    if let Some(locked) = locked_hint(args.locked, args.unlocked) {
        doc = doc.with_locked(locked);
    }

    let report = GateEngine::standard(config.rules).validate(&doc, 1);
    let rendered = to_json_or_exit(&report.to_wire());
    if let Some(path) = &args.json {
        write_text_or_exit(path, &format!("{rendered}\n"));
    }
    println!("{rendered}");

    std::process::exit(if report.status.is_pass() { 0 } else { 1 });
}
