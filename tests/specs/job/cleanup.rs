//! Retention cleanup specs

use std::time::Duration;

use crate::prelude::*;

#[test]
fn cleanup_removes_old_finished_jobs_only() {
    let lib = Library::new();
    let done = lib.submit(&["scan"]);
    lib.spindle().args(&["cancel", &done]).passes();
    let waiting = lib.submit(&["scan"]);

    std::thread::sleep(Duration::from_millis(1_200));
    let report = lib.json(&["cleanup", "--older-than", "1s"]);
    assert_eq!(report["removed"], serde_json::json!([done]));

    lib.spindle().args(&["show", &done]).fails_with(3);
    assert_eq!(lib.status(&waiting), "queued");
}

#[test]
fn recent_jobs_are_kept() {
    let lib = Library::new();
    let done = lib.submit(&["scan"]);
    lib.spindle().args(&["cancel", &done]).passes();
    lib.spindle()
        .args(&["cleanup", "--older-than", "7d"])
        .passes()
        .stdout_has("0 job(s) older than 7d removed");
}

#[test]
fn cleanup_requires_a_valid_age() {
    let lib = Library::new();
    lib.spindle().args(&["cleanup", "--older-than", "soon"]).fails_with(2);
    lib.spindle().args(&["cleanup"]).fails_with(2);
}
