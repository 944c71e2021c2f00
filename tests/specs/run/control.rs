//! Specs for commands issued while `spindle run` is active.

use crate::prelude::*;

const STALLED_WORKER: &str = r#"
[executors.stem-separation]
command = "sh"
args = ["-c", "sleep 30", "stalled-worker"]
"#;

#[test]
fn submit_and_cancel_while_running() {
    let lib = Library::new();
    lib.config(STALLED_WORKER);
    let _run = lib.serve();

    let id = lib.submit(&["stem-separation"]);
    lib.wait_for_status(&id, "running");

    lib.spindle().args(&["cancel", &id]).passes().stdout_has("Cancelled job");
    assert_eq!(lib.status(&id), "cancelled");

    let stats = lib.json(&["stats"]);
    assert_eq!(stats["cancelled"], 1);
    let listed = lib.json(&["list"]);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
}

#[test]
fn second_run_is_refused() {
    let lib = Library::new();
    lib.config(STALLED_WORKER);
    let _run = lib.serve();

    lib.spindle().args(&["run"]).fails_with(4).stderr_has("locked");
}

#[test]
fn rejections_keep_their_exit_codes_over_the_socket() {
    let lib = Library::new();
    lib.config(STALLED_WORKER);
    let _run = lib.serve();

    lib.spindle().args(&["show", "job-missing"]).fails_with(3);
    let id = lib.submit(&["stem-separation", "--no-enqueue"]);
    lib.spindle().args(&["cancel", &id]).fails_with(2);
}
