use crate::cli::ModeArg;
use crate::support::{
    fail, load_config_or_exit, pipeline_or_exit, print_json_or_exit, write_text,
};
use serde::Serialize;
use somatic_pipeline::Pipeline;
use somatic_sheet::schema::{STATUS_DONE, STATUS_FAIL};
use somatic_sheet::{JsonFileStore, QueueColumns, QueueEntry, RowStore, queue_entries};
use std::path::{Path, PathBuf};

pub struct Args {
    pub store: String,
    pub tab: String,
    pub status: String,
    pub limit: Option<usize>,
    pub out_dir: String,
    pub dry_run: bool,
    pub mode: Option<ModeArg>,
    pub config: Option<String>,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct QueueItem {
    row: usize,
    idem_key: String,
    draft_path: String,
    status: String,
    notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    out: Option<String>,
}

#[derive(Debug, Serialize)]
struct QueueReport {
    tab: String,
    dry_run: bool,
    selected: usize,
    done: usize,
    failed: usize,
    items: Vec<QueueItem>,
}

/// Each selected row ends `DONE` or `FAIL`; one row's failure never stops
/// the queue.
pub fn run(args: Args) {
    let store_path = PathBuf::from(&args.store);
    let store = JsonFileStore::new(&store_path);
    let rows = store.read_rows(&args.tab).unwrap_or_else(|e| fail(e));
    let (columns, entries) = queue_entries(&args.tab, &rows).unwrap_or_else(|e| fail(e));

    let selected: Vec<QueueEntry> = entries
        .into_iter()
        .filter(|entry| entry.status == args.status)
        .take(args.limit.unwrap_or(usize::MAX))
        .collect();

    let mut report = QueueReport {
        tab: args.tab.clone(),
        dry_run: args.dry_run,
        selected: selected.len(),
        done: 0,
        failed: 0,
        items: Vec::new(),
    };

    if args.dry_run {
        report.items = selected
            .into_iter()
            .map(|entry| QueueItem {
                row: entry.row_number,
                idem_key: entry.idem_key,
                draft_path: entry.draft_path,
                status: entry.status,
                notes: entry.notes,
                out: None,
            })
            .collect();
    } else {
        let config = load_config_or_exit(args.config.as_deref(), args.mode);
        let pipeline = pipeline_or_exit(&config);
        let base = store_path.parent().unwrap_or(Path::new("."));
        let out_dir = Path::new(&args.out_dir);
        for entry in selected {
            let item = process(&pipeline, base, out_dir, &entry);
            if item.status == STATUS_DONE {
                report.done += 1;
            } else {
                report.failed += 1;
            }
            record(&store, &args.tab, columns, &item);
            report.items.push(item);
        }
    }

    if args.json {
        print_json_or_exit(&report);
    } else {
        for item in &report.items {
            println!("row {:<4} {:<5} {} {}", item.row, item.status, item.draft_path, item.notes);
        }
        println!(
            "selected={} done={} failed={}{}",
            report.selected,
            report.done,
            report.failed,
            if report.dry_run { " (dry run)" } else { "" }
        );
    }
}

fn process(pipeline: &Pipeline, base: &Path, out_dir: &Path, entry: &QueueEntry) -> QueueItem {
    let mut item = QueueItem {
        row: entry.row_number,
        idem_key: entry.idem_key.clone(),
        draft_path: entry.draft_path.clone(),
        status: STATUS_FAIL.to_string(),
        notes: String::new(),
        out: None,
    };
    if entry.draft_path.is_empty() {
        item.notes = "error: empty DraftPath".to_string();
        return item;
    }

    let draft = resolve(base, &entry.draft_path);
    let text = match std::fs::read_to_string(&draft) {
        Ok(text) => text,
        Err(e) => {
            item.notes = format!("error: failed to read {}: {e}", draft.display());
            return item;
        }
    };
    let outcome = match pipeline.run(&text, None) {
        Ok(outcome) => outcome,
        Err(e) => {
            item.notes = format!("error: {e}");
            return item;
        }
    };

    let file_name = draft
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("row{}.md", entry.row_number));
    let out = out_dir.join(file_name);
    if let Err(e) = write_text(&out, outcome.final_document()) {
        item.notes = format!("error: {e}");
        return item;
    }

    if outcome.final_status.is_pass() {
        item.status = STATUS_DONE.to_string();
    }
    item.notes = format!(
        "{} attempts={} run={}",
        outcome.final_status, outcome.attempt_count, outcome.run_id
    );
    item.out = Some(out.display().to_string());
    item
}

fn resolve(base: &Path, draft: &str) -> PathBuf {
    let path = Path::new(draft);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Write Status and Notes back. A store failure is logged and the queue
/// moves on.
fn record(store: &JsonFileStore, tab: &str, columns: QueueColumns, item: &QueueItem) {
    let updates = [(columns.status, &item.status), (columns.notes, &item.notes)];
    for (col, value) in updates {
        if let Err(error) = store.update_cell(tab, item.row, col, value) {
            tracing::warn!(row = item.row, %error, "queue row not updated");
        }
    }
}
