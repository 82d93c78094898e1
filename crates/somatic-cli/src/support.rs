use crate::cli::ModeArg;
use serde::Serialize;
use somatic_pipeline::{Pipeline, PipelineConfig};
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Exit code for I/O, configuration and other operational errors.
pub const EXIT_ERROR: i32 = 2;

/// Log to stderr so JSON on stdout stays clean. `SOMATIC_LOG` takes an
/// `EnvFilter` directive; the default is `warn`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env("SOMATIC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    std::process::exit(EXIT_ERROR);
}

pub fn locked_hint(locked: bool, unlocked: bool) -> Option<bool> {
    match (locked, unlocked) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

pub fn load_config_or_exit(config: Option<&str>, mode: Option<ModeArg>) -> PipelineConfig {
    let mut loaded = PipelineConfig::load(config.map(Path::new)).unwrap_or_else(|e| fail(e));
    if let Some(mode) = mode {
        loaded.repair.mode = mode.into();
    }
    loaded
}

pub fn pipeline_or_exit(config: &PipelineConfig) -> Pipeline {
    Pipeline::from_config(config).unwrap_or_else(|e| fail(e))
}

pub fn read_text_or_exit(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("failed to read {}: {e}", path.display())))
}

pub fn write_text(path: impl AsRef<Path>, text: &str) -> Result<(), String> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|e| format!("failed to create {}: {e}", parent.display()))?;
    }
    fs::write(path, text).map_err(|e| format!("failed to write {}: {e}", path.display()))
}

pub fn write_text_or_exit(path: impl AsRef<Path>, text: &str) {
    write_text(path, text).unwrap_or_else(|e| fail(e));
}

pub fn to_json_or_exit(value: &impl Serialize) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| fail(format!("json serialization: {e}")))
}

pub fn print_json_or_exit(value: &impl Serialize) {
    println!("{}", to_json_or_exit(value));
}
