// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors reported synchronously to callers.

use thiserror::Error;

use crate::job::{JobId, JobStatus};

/// A job description was rejected at creation. Nothing was persisted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown job type: {0}")]
    UnknownKind(String),
    #[error("unknown job status: {0}")]
    UnknownStatus(String),
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("priority {0} out of range (1..=10)")]
    PriorityOutOfRange(u8),
    #[error("timeout must be at least one second")]
    InvalidTimeout,
    #[error("max attempts {0} out of range (1..=100)")]
    InvalidMaxAttempts(u32),
    #[error("batch size must be at least one")]
    EmptyBatch,
    #[error("batches cannot be nested")]
    NestedBatch,
    #[error("parent job not found: {0}")]
    UnknownParent(JobId),
    #[error("parent {0} would create a cycle")]
    ParentCycle(JobId),
    #[error("parent {0} is not a batch")]
    NotABatch(JobId),
    #[error("parent {0} is already {1}")]
    ParentTerminal(JobId, JobStatus),
    #[error("batch {parent} already has {size} children")]
    BatchFull { parent: JobId, size: u32 },
}

/// A transition outside the state machine table. State is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("invalid transition for {id}: {from} -> {to}")]
    InvalidTransition { id: JobId, from: JobStatus, to: JobStatus },
    #[error("job {id} is {status}; progress is only accepted while running")]
    NotRunning { id: JobId, status: JobStatus },
    #[error("job {id} has used {attempts} of {max_attempts} attempts")]
    AttemptsExhausted { id: JobId, attempts: u32, max_attempts: u32 },
    #[error("job {id} is on attempt {current}; report for attempt {attempt} ignored")]
    StaleAttempt { id: JobId, attempt: u32, current: u32 },
}
