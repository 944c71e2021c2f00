//! Batch specs: parent/child creation, rollup display, cascade cancel.

use crate::prelude::*;

#[test]
fn batch_parent_tracks_its_children() {
    let lib = Library::new();
    let parent = lib.submit(&["batch-analyze", "--batch-size", "2"]);
    let a = lib.submit(&["batch-analyze", "--parent", &parent]);
    let _b = lib.submit(&["batch-analyze", "--parent", &parent]);

    let shown = lib.json(&["show", &parent]);
    assert_eq!(shown["job"]["batch_size"], 2);
    assert_eq!(shown["batch"]["pending"], 2);
    assert_eq!(shown["children"].as_array().map(Vec::len), Some(2));

    let children = lib.json(&["list", "--parent", &parent]);
    assert!(children.as_array().unwrap().iter().any(|c| c["id"] == a.as_str()));
}

#[test]
fn full_batch_rejects_more_children() {
    let lib = Library::new();
    let parent = lib.submit(&["batch-analyze", "--batch-size", "1"]);
    lib.submit(&["batch-analyze", "--parent", &parent]);
    lib.spindle()
        .args(&["submit", "batch-analyze", "--parent", &parent])
        .fails_with(2)
        .stderr_has("already has 1 children");
}

#[test]
fn child_of_plain_job_is_rejected() {
    let lib = Library::new();
    let plain = lib.submit(&["scan"]);
    lib.spindle()
        .args(&["submit", "analyze", "--parent", &plain])
        .fails_with(2)
        .stderr_has("not a batch");
}

#[test]
fn cancelling_the_parent_cancels_children() {
    let lib = Library::new();
    let parent = lib.submit(&["batch-analyze", "--batch-size", "2"]);
    let a = lib.submit(&["batch-analyze", "--parent", &parent]);
    let b = lib.submit(&["batch-analyze", "--parent", &parent]);

    lib.spindle().args(&["cancel", &parent]).passes();
    assert_eq!(lib.status(&parent), "cancelled");
    assert_eq!(lib.status(&a), "cancelled");
    assert_eq!(lib.status(&b), "cancelled");
}

#[test]
fn batch_text_view_shows_counts() {
    let lib = Library::new();
    let parent = lib.submit(&["batch-analyze", "--batch-size", "3"]);
    lib.submit(&["batch-analyze", "--parent", &parent]);
    lib.spindle().args(&["show", &parent]).passes().stdout_has("Batch:").stdout_has("0/3 finished");
}
