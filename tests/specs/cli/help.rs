//! CLI help output specs

use crate::prelude::*;

#[test]
fn no_args_shows_usage_and_exits_zero() {
    cli().passes().stdout_has("Usage:");
}

#[test]
fn help_lists_commands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("submit")
        .stdout_has("cancel")
        .stdout_has("cleanup")
        .stdout_has("run");
}

#[test]
fn submit_help_shows_options() {
    cli()
        .args(&["submit", "--help"])
        .passes()
        .stdout_has("--priority")
        .stdout_has("--batch-size")
        .stdout_has("--no-enqueue");
}

#[test]
fn version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.2");
}

#[test]
fn unknown_kind_is_a_usage_error() {
    let lib = Library::new();
    lib.spindle().args(&["submit", "transcode"]).fails_with(2).stderr_has("transcode");
}
