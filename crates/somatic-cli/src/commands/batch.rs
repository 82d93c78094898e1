use crate::cli::ModeArg;
use crate::support::{fail, load_config_or_exit, pipeline_or_exit, print_json_or_exit, write_text};
use somatic_pipeline::{BatchMode, BatchSummary, collect_markdown, run_batch};
use std::path::Path;

pub struct Args {
    pub dir: String,
    pub repair: bool,
    pub out_dir: Option<String>,
    pub mode: Option<ModeArg>,
    pub config: Option<String>,
    pub json: bool,
}

/// Exit 0 when every card passes, 1 otherwise. Per-card errors never stop
/// the batch.
pub fn run(args: Args) {
    let config = load_config_or_exit(args.config.as_deref(), args.mode);
    let pipeline = pipeline_or_exit(&config);
    let root = Path::new(&args.dir);
    let listing = collect_markdown(root).unwrap_or_else(|e| fail(e));
    let mode = if args.repair {
        BatchMode::Pipeline
    } else {
        BatchMode::ValidateOnly
    };

    let mut summary = run_batch(&pipeline, &listing, mode);
    if let Some(out_dir) = &args.out_dir {
        write_finals(root, Path::new(out_dir), &mut summary);
    }

    if args.json {
        print_json_or_exit(&summary);
    } else {
        for item in &summary.items {
            match &item.error {
                Some(error) => println!("{:<18} {} ({error})", item.status, item.path.display()),
                None => println!("{:<18} {}", item.status, item.path.display()),
            }
        }
        let counts: Vec<String> = summary
            .by_status
            .iter()
            .map(|(status, count)| format!("{status}={count}"))
            .collect();
        println!("total={} {}", summary.total, counts.join(" "));
    }

    std::process::exit(if summary.all_passed() { 0 } else { 1 });
}

/// Write every repaired card under `out_dir` at its path relative to `root`.
/// A write failure is recorded on the item.
fn write_finals(root: &Path, out_dir: &Path, summary: &mut BatchSummary) {
    for item in &mut summary.items {
        let Some(document) = &item.final_document else {
            continue;
        };
        let relative = item.path.strip_prefix(root).unwrap_or(&item.path);
        if let Err(error) = write_text(out_dir.join(relative), document) {
            tracing::warn!(path = %item.path.display(), %error, "final card not written");
            item.error = Some(error);
        }
    }
}
