//! Job lifecycle specs: submit, show, cancel, retry and error exits.

use crate::prelude::*;

#[test]
fn submit_queues_with_defaults() {
    let lib = Library::new();
    let job = lib.json(&["submit", "analyze", "--payload", r#"{"track_id": 42}"#]);

    assert_eq!(job["status"], "queued");
    assert_eq!(job["kind"], "analyze");
    assert_eq!(job["priority"], 5);
    assert_eq!(job["max_attempts"], 3);
    assert_eq!(job["attempts"], 0);
    assert_eq!(job["payload"]["track_id"], 42);
}

#[test]
fn submit_text_reports_the_id() {
    let lib = Library::new();
    lib.spindle()
        .args(&["submit", "scan", "--priority", "2"])
        .passes()
        .stdout_has("Submitted job job-")
        .stdout_has("priority 2");
}

#[test]
fn jobs_survive_between_invocations() {
    let lib = Library::new();
    let id = lib.submit(&["tag-write", "--no-enqueue"]);
    assert_eq!(lib.status(&id), "created");

    lib.spindle().args(&["enqueue", &id]).passes().stdout_has("Queued job");
    assert_eq!(lib.status(&id), "queued");
}

#[test]
fn show_accepts_an_id_prefix() {
    let lib = Library::new();
    let id = lib.submit(&["export"]);
    let prefix = &id["job-".len().."job-".len() + 10];
    lib.spindle().args(&["show", prefix]).passes().stdout_has(&id).stdout_has("export");
}

#[test]
fn cancel_then_cancel_again_is_rejected() {
    let lib = Library::new();
    let id = lib.submit(&["scan"]);

    lib.spindle().args(&["cancel", &id]).passes().stdout_has("Cancelled job");
    assert_eq!(lib.status(&id), "cancelled");
    lib.spindle().args(&["cancel", &id]).fails_with(2).stderr_has("invalid transition");
}

#[test]
fn cancel_created_job_is_rejected() {
    let lib = Library::new();
    let id = lib.submit(&["scan", "--no-enqueue"]);
    lib.spindle().args(&["cancel", &id]).fails_with(2);
    assert_eq!(lib.status(&id), "created");
}

#[test]
fn retry_of_queued_job_is_rejected() {
    let lib = Library::new();
    let id = lib.submit(&["scan"]);
    lib.spindle().args(&["retry", &id]).fails_with(2);
}

#[test]
fn unknown_id_exits_not_found() {
    let lib = Library::new();
    lib.spindle().args(&["show", "job-nothing"]).fails_with(3).stderr_has("not found");
}

#[test]
fn invalid_input_is_rejected_without_creating_anything() {
    let lib = Library::new();
    lib.spindle().args(&["submit", "scan", "--priority", "11"]).fails_with(2);
    lib.spindle().args(&["submit", "scan", "--payload", "[1,2]"]).fails_with(2);
    lib.spindle().args(&["submit", "scan", "--payload", "{oops"]).fails_with(2);
    lib.spindle().args(&["submit", "scan", "--timeout", "0"]).fails_with(2);
    assert_eq!(lib.json(&["stats"])["created"], 0);
    assert_eq!(lib.json(&["stats"])["queued"], 0);
}

#[test]
fn list_filters_by_status_and_kind() {
    let lib = Library::new();
    lib.submit(&["scan"]);
    lib.submit(&["export"]);
    lib.submit(&["export", "--no-enqueue"]);

    let exports = lib.json(&["list", "--kind", "export"]);
    assert_eq!(exports.as_array().map(Vec::len), Some(2));
    let queued_exports = lib.json(&["list", "--kind", "export", "--status", "queued"]);
    assert_eq!(queued_exports.as_array().map(Vec::len), Some(1));
}
