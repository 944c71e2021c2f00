// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let config = EngineConfig::load(&dir.path().join("spindle.toml")).unwrap();
    assert_eq!(config, EngineConfig::default());
    assert_eq!(config.timeout_check_interval, Duration::from_secs(5));
    assert_eq!(config.workers.concurrency, 2);
}

#[test]
fn parses_full_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("spindle.toml");
    std::fs::write(
        &path,
        r#"
default_max_attempts = 5
timeout_check_interval = "250ms"
cancel_grace_period = "2s"

[workers]
concurrency = 4

[executors.analyze]
command = "python3"
args = ["tempo_worker.py"]

[executors.stem-separation]
command = "/opt/stems/separate"
"#,
    )
    .unwrap();

    let config = EngineConfig::load(&path).unwrap();

    assert_eq!(config.default_max_attempts, 5);
    assert_eq!(config.default_timeout_secs, 3600);
    assert_eq!(config.timeout_check_interval, Duration::from_millis(250));
    assert_eq!(config.cancel_grace_period, Duration::from_secs(2));
    assert_eq!(config.workers.concurrency, 4);
    assert_eq!(config.workers.poll_interval, Duration::from_secs(1));
    assert_eq!(config.executors["analyze"].args, vec!["tempo_worker.py"]);
    assert_eq!(config.executors["stem-separation"].command, "/opt/stems/separate");
}

#[yare::parameterized(
    zero_attempts   = { "default_max_attempts = 0" },
    huge_attempts   = { "default_max_attempts = 101" },
    zero_timeout    = { "default_timeout_secs = 0" },
    zero_interval   = { "timeout_check_interval = \"0s\"" },
    zero_workers    = { "[workers]\nconcurrency = 0" },
    unknown_kind    = { "[executors.transcode]\ncommand = \"x\"" },
    empty_command   = { "[executors.scan]\ncommand = \" \"" },
)]
fn rejects_invalid_values(toml: &str) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("spindle.toml");
    std::fs::write(&path, toml).unwrap();
    assert!(matches!(EngineConfig::load(&path), Err(ConfigError::Invalid(_))));
}

#[test]
fn unknown_keys_are_parse_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("spindle.toml");
    std::fs::write(&path, "max_retries = 3").unwrap();
    assert!(matches!(EngineConfig::load(&path), Err(ConfigError::Parse { .. })));
}

#[test]
fn spec_carries_configured_defaults() {
    let config = EngineConfig { default_max_attempts: 7, default_timeout_secs: 90, ..Default::default() };
    let spec = config.spec(JobKind::Export);
    assert_eq!(spec.max_attempts, 7);
    assert_eq!(spec.timeout_secs, 90);
    assert_eq!(spec.kind, JobKind::Export);
}
