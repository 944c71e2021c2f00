// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.

use std::fmt;

use spindle_engine::EngineError;

/// Exit code for rejected input (validation, illegal transitions).
pub const EXIT_REJECTED: i32 = 2;
/// Exit code for ids that match no job.
pub const EXIT_NOT_FOUND: i32 = 3;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

impl From<EngineError> for ExitError {
    fn from(e: EngineError) -> Self {
        let code = match &e {
            EngineError::NotFound(_) => EXIT_NOT_FOUND,
            EngineError::Validation(_)
            | EngineError::Transition(_)
            | EngineError::AmbiguousId { .. } => EXIT_REJECTED,
            EngineError::Store(_) => 1,
        };
        Self::new(code, e.to_string())
    }
}
