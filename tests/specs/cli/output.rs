//! Text vs JSON output specs

use crate::prelude::*;

#[test]
fn empty_library_lists_no_jobs() {
    let lib = Library::new();
    lib.spindle().args(&["list"]).passes().stdout_has("No jobs");
    assert_eq!(lib.json(&["list"]), serde_json::json!([]));
}

#[test]
fn list_text_has_header_and_short_id() {
    let lib = Library::new();
    let id = lib.submit(&["scan"]);
    let short = &id["job-".len().."job-".len() + 8];
    lib.spindle()
        .args(&["list"])
        .passes()
        .stdout_has("STATUS")
        .stdout_has(short)
        .stdout_has("queued");
}

#[test]
fn stats_counts_every_status() {
    let lib = Library::new();
    lib.submit(&["scan"]);
    lib.submit(&["export", "--no-enqueue"]);

    let stats = lib.json(&["stats"]);
    assert_eq!(stats["queued"], 1);
    assert_eq!(stats["created"], 1);
    assert_eq!(stats["running"], 0);
    lib.spindle().args(&["stats"]).passes().stdout_has("total").stdout_has("2");
}
