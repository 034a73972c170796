//! Observability: tracing init and the subprocess audit log.
//!
//! Driven by `config::ObservabilityConfig` (MLSTART_QUIET, MLSTART_LOG_LEVEL,
//! MLSTART_LOG_JSON, MLSTART_AUDIT_LOG).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::Utc;
use serde_json::json;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Initialize tracing. Call once at process startup.
///
/// `verbose` (from `-v`) raises the default level to debug; `RUST_LOG`
/// always wins when set.
pub fn init_tracing(verbose: bool) {
    let cfg = crate::config::ObservabilityConfig::from_env();
    let level = if cfg.quiet {
        "mlstart=warn".to_string()
    } else if verbose {
        "mlstart=debug".to_string()
    } else {
        cfg.log_level.clone()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
}

fn audit_path() -> Option<&'static Path> {
    static AUDIT_PATH: OnceLock<Option<PathBuf>> = OnceLock::new();
    AUDIT_PATH
        .get_or_init(|| {
            let path = crate::config::ObservabilityConfig::from_env()
                .audit_log
                .clone()
                .map(PathBuf::from)?;
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            Some(path)
        })
        .as_deref()
}

fn append_jsonl(path: &Path, record: &serde_json::Value) {
    if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(path) {
        if let Ok(line) = serde_json::to_string(record) {
            let _ = writeln!(f, "{}", line);
        }
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Audit: a subprocess is about to be spawned.
pub fn audit_process_started(program: &str, args: &[String], cwd: Option<&Path>) {
    if let Some(path) = audit_path() {
        let record = json!({
            "ts": now(),
            "event": "process_started",
            "program": program,
            "args": args,
            "cwd": cwd.map(|c| c.to_string_lossy().into_owned()),
        });
        append_jsonl(path, &record);
    }
}

/// Audit: a subprocess exited (or could not be spawned, `exit_code` = None).
pub fn audit_process_finished(program: &str, exit_code: Option<i32>, duration_ms: u64) {
    if let Some(path) = audit_path() {
        let record = json!({
            "ts": now(),
            "event": "process_finished",
            "program": program,
            "exit_code": exit_code,
            "duration_ms": duration_ms,
            "success": exit_code == Some(0),
        });
        append_jsonl(path, &record);
    }
}

/// Audit: a pipeline stage completed.
pub fn audit_stage_reached(stage: crate::Stage, target: &Path) {
    tracing::debug!(stage = %stage, target = %target.display(), "stage reached");
    if let Some(path) = audit_path() {
        let record = json!({
            "ts": now(),
            "event": "stage_reached",
            "stage": stage.as_str(),
            "target": target.to_string_lossy(),
        });
        append_jsonl(path, &record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_jsonl_writes_one_line_per_record() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("audit.jsonl");
        append_jsonl(&path, &json!({"event": "a"}));
        append_jsonl(&path, &json!({"event": "b"}));
        let content = std::fs::read_to_string(&path).unwrap();
        let events: Vec<String> = content
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["event"].to_string())
            .collect();
        assert_eq!(events, vec!["\"a\"", "\"b\""]);
    }
}
