//! Crash recovery specs

use std::time::Duration;

use crate::prelude::*;

const SLOW_WORKER: &str = r#"
[executors.scan]
command = "sh"
args = ["-c", "sleep 10", "slow-worker"]
"#;

#[test]
fn clean_library_has_nothing_to_recover() {
    let lib = Library::new();
    lib.spindle().args(&["recover"]).passes().stdout_has("Nothing to recover");
}

#[test]
fn killed_run_leaves_job_requeued() {
    let lib = Library::new();
    lib.config(SLOW_WORKER);
    let id = lib.submit(&["scan"]);

    // SIGKILL mid-job: no chance to report anything
    lib.spindle().args(&["run"]).timeout(Duration::from_secs(2)).output();

    let report = lib.json(&["recover"]);
    assert_eq!(report["interrupted"], serde_json::json!([id]));
    assert_eq!(report["requeued"], serde_json::json!([id]));

    let job = lib.json(&["show", &id]);
    assert_eq!(job["status"], "queued");
    assert_eq!(job["attempts"], 1);
    assert_eq!(job["error"], "interrupted by restart");
}
