// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error types

use spindle_core::{JobId, TransitionError, ValidationError};
use spindle_storage::StoreError;
use thiserror::Error;

/// Errors reported synchronously by engine operations.
///
/// Execution failures, timeouts and interrupted jobs are never errors here:
/// they are recorded on the job and observed through events or queries.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("ambiguous job id prefix '{prefix}' matches {matches} jobs")]
    AmbiguousId { prefix: String, matches: usize },
    #[error("storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => EngineError::NotFound(id),
            other => EngineError::Store(other),
        }
    }
}

impl EngineError {
    /// True when the job simply moved on (e.g. an executor reporting on a
    /// job that was cancelled or timed out under it).
    pub fn is_stale_report(&self) -> bool {
        matches!(
            self,
            EngineError::Transition(
                TransitionError::InvalidTransition { .. }
                    | TransitionError::NotRunning { .. }
                    | TransitionError::StaleAttempt { .. }
            )
        )
    }
}

/// Errors from wiring executors to job types.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("no executor configured for job type {0}")]
    NoExecutor(spindle_core::JobKind),
    #[error("invalid executor config for {kind}: {reason}")]
    InvalidConfig { kind: String, reason: String },
}
