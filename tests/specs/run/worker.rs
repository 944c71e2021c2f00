//! Worker pool specs: subprocess executors driven by `spindle run`.

use std::time::Duration;

use crate::prelude::*;

const TEMPO_WORKER: &str = r#"
[executors.analyze]
command = "sh"
args = ["-c", "echo PROGRESS:50; echo 'RESULT:{\"bpm\":128}'", "tempo-worker"]
"#;

const STALLED_WORKER: &str = r#"
[executors.stem-separation]
command = "sh"
args = ["-c", "sleep 30", "stalled-worker"]
"#;

const BROKEN_WORKER: &str = r#"
[executors.export]
command = "sh"
args = ["-c", "echo 'ERROR: disk full' >&2; exit 1", "broken-worker"]
"#;

/// `run` only stops on Ctrl-C, so let it work for a while and then kill it.
fn run_for(lib: &Library, limit: Duration) {
    lib.spindle().args(&["run"]).env("SPINDLE_TIMEOUT_CHECK_MS", "100").timeout(limit).output();
}

#[test]
fn completed_job_records_worker_result() {
    let lib = Library::new();
    lib.config(TEMPO_WORKER);
    let id = lib.submit(&["analyze", "--payload", r#"{"track_id": 7}"#]);

    run_for(&lib, Duration::from_secs(3));

    let job = lib.json(&["show", &id]);
    assert_eq!(job["status"], "completed");
    assert_eq!(job["progress"], 100);
    assert_eq!(job["result"]["bpm"], 128);
    assert!(job["completed_at_ms"].is_u64());
}

#[test]
fn overdue_job_times_out() {
    let lib = Library::new();
    lib.config(STALLED_WORKER);
    let id = lib.submit(&["stem-separation", "--timeout", "1", "--max-attempts", "1"]);

    run_for(&lib, Duration::from_secs(4));

    let job = lib.json(&["show", &id]);
    assert_eq!(job["status"], "timeout");
    assert_eq!(job["attempts"], 1);
    assert_eq!(job["error"], "deadline exceeded");
}

#[test]
fn failing_worker_exhausts_attempts() {
    let lib = Library::new();
    lib.config(BROKEN_WORKER);
    let id = lib.submit(&["export", "--max-attempts", "2"]);

    run_for(&lib, Duration::from_secs(4));

    let job = lib.json(&["show", &id]);
    assert_eq!(job["status"], "failed");
    assert_eq!(job["attempts"], 2);
    assert!(job["error"].as_str().unwrap_or_default().contains("disk full"));
}

#[test]
fn unknown_executor_type_is_rejected() {
    let lib = Library::new();
    lib.config("[executors.transcode]\ncommand = \"true\"\n");
    lib.spindle().args(&["run"]).fails_with(2).stderr_has("transcode");
}
