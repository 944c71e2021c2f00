// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI.

use std::path::PathBuf;
use std::time::Duration;

use crate::exit_error::ExitError;

/// Resolve state directory: SPINDLE_STATE_DIR > XDG_STATE_HOME/spindle > ~/.local/state/spindle
pub fn state_dir() -> Result<PathBuf, ExitError> {
    if let Ok(dir) = std::env::var("SPINDLE_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("spindle"));
    }
    let home = std::env::var("HOME")
        .map_err(|_| ExitError::new(2, "cannot determine state directory: set SPINDLE_STATE_DIR"))?;
    Ok(PathBuf::from(home).join(".local/state/spindle"))
}

/// Timeout Monitor interval override
pub fn timeout_check_ms() -> Option<Duration> {
    std::env::var("SPINDLE_TIMEOUT_CHECK_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

/// How long a CLI command waits on the control socket of a running `spindle run`
pub fn ipc_timeout() -> Duration {
    std::env::var("SPINDLE_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Worker concurrency override
pub fn workers() -> Option<usize> {
    std::env::var("SPINDLE_WORKERS").ok().and_then(|s| s.parse::<usize>().ok()).filter(|n| *n > 0)
}

/// Tracing filter directives, if set
pub fn log_filter() -> Option<String> {
    std::env::var("SPINDLE_LOG").ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
