// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn clear() {
    for var in ["SPINDLE_STATE_DIR", "XDG_STATE_HOME", "SPINDLE_TIMEOUT_CHECK_MS", "SPINDLE_WORKERS", "SPINDLE_LOG", "SPINDLE_IPC_TIMEOUT_MS"] {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn state_dir_prefers_explicit_override() {
    clear();
    std::env::set_var("XDG_STATE_HOME", "/xdg");
    std::env::set_var("SPINDLE_STATE_DIR", "/explicit");
    assert_eq!(state_dir().unwrap(), PathBuf::from("/explicit"));

    std::env::remove_var("SPINDLE_STATE_DIR");
    assert_eq!(state_dir().unwrap(), PathBuf::from("/xdg/spindle"));
    clear();
}

#[test]
#[serial]
fn state_dir_falls_back_to_home() {
    clear();
    let home = std::env::var("HOME").ok();
    std::env::set_var("HOME", "/home/dj");
    assert_eq!(state_dir().unwrap(), PathBuf::from("/home/dj/.local/state/spindle"));
    if let Some(home) = home {
        std::env::set_var("HOME", home);
    }
}

#[test]
#[serial]
fn numeric_overrides_ignore_garbage_and_zero() {
    clear();
    assert_eq!(timeout_check_ms(), None);
    std::env::set_var("SPINDLE_TIMEOUT_CHECK_MS", "250");
    assert_eq!(timeout_check_ms(), Some(Duration::from_millis(250)));
    std::env::set_var("SPINDLE_TIMEOUT_CHECK_MS", "0");
    assert_eq!(timeout_check_ms(), None);

    std::env::set_var("SPINDLE_WORKERS", "four");
    assert_eq!(workers(), None);
    std::env::set_var("SPINDLE_WORKERS", "4");
    assert_eq!(workers(), Some(4));
    clear();
}

#[test]
#[serial]
fn log_filter_ignores_empty_value() {
    clear();
    assert_eq!(log_filter(), None);
    std::env::set_var("SPINDLE_LOG", "");
    assert_eq!(log_filter(), None);
    std::env::set_var("SPINDLE_LOG", "spindle_engine=debug");
    assert_eq!(log_filter().as_deref(), Some("spindle_engine=debug"));
    clear();
}

#[test]
#[serial]
fn ipc_timeout_defaults_to_five_seconds() {
    clear();
    assert_eq!(ipc_timeout(), Duration::from_secs(5));
    std::env::set_var("SPINDLE_IPC_TIMEOUT_MS", "250");
    assert_eq!(ipc_timeout(), Duration::from_millis(250));
    std::env::set_var("SPINDLE_IPC_TIMEOUT_MS", "0");
    assert_eq!(ipc_timeout(), Duration::from_secs(5));
    clear();
}
