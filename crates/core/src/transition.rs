// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job state machine.
//!
//! | From            | To        | Transition |
//! |-----------------|-----------|------------|
//! | created         | queued    | `Enqueue`  |
//! | queued          | running   | `Dispatch` |
//! | running         | completed | `Succeed`  |
//! | running         | failed    | `Fail`     |
//! | running         | timeout   | `TimeOut`  |
//! | queued, running | cancelled | `Cancel`   |
//! | failed, timeout | queued    | `Requeue`  |
//!
//! Everything else is rejected with [`TransitionError::InvalidTransition`].
//! Planning is pure: [`plan`] returns a [`JobPatch`] and never touches the
//! job, so a rejected transition leaves state unchanged by construction.

use serde_json::Value;

use crate::error::TransitionError;
use crate::event::TransitionEvent;
use crate::job::{Job, JobStatus};
use crate::patch::JobPatch;

/// Error text recorded when the Timeout Monitor fires.
pub const DEADLINE_EXCEEDED: &str = "deadline exceeded";
/// Error text recorded on cancellation.
pub const CANCELLED: &str = "cancelled";
/// Error text recorded when recovery finds a job stuck in `running`.
pub const INTERRUPTED: &str = "interrupted by restart";

/// A requested status change.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Enqueue,
    Dispatch,
    Succeed { result: Value },
    Fail { error: String },
    TimeOut { reason: String },
    Cancel { reason: String },
    Requeue,
}

impl Transition {
    pub fn fail(error: impl Into<String>) -> Self {
        Transition::Fail { error: error.into() }
    }

    pub fn timeout() -> Self {
        Transition::TimeOut { reason: DEADLINE_EXCEEDED.to_string() }
    }

    pub fn cancel() -> Self {
        Transition::Cancel { reason: CANCELLED.to_string() }
    }

    /// Status the job ends up in when the transition is accepted.
    pub fn target(&self) -> JobStatus {
        match self {
            Transition::Enqueue | Transition::Requeue => JobStatus::Queued,
            Transition::Dispatch => JobStatus::Running,
            Transition::Succeed { .. } => JobStatus::Completed,
            Transition::Fail { .. } => JobStatus::Failed,
            Transition::TimeOut { .. } => JobStatus::Timeout,
            Transition::Cancel { .. } => JobStatus::Cancelled,
        }
    }

    fn allowed_from(&self, from: JobStatus) -> bool {
        use JobStatus::*;
        match self {
            Transition::Enqueue => from == Created,
            Transition::Dispatch => from == Queued,
            Transition::Succeed { .. } | Transition::Fail { .. } | Transition::TimeOut { .. } => {
                from == Running
            }
            Transition::Cancel { .. } => matches!(from, Queued | Running),
            Transition::Requeue => matches!(from, Failed | Timeout),
        }
    }
}

/// Whether the table contains an edge `from -> to`.
pub fn is_legal(from: JobStatus, to: JobStatus) -> bool {
    use JobStatus::*;
    matches!(
        (from, to),
        (Created, Queued)
            | (Queued, Running)
            | (Running, Completed)
            | (Running, Failed)
            | (Running, Timeout)
            | (Queued, Cancelled)
            | (Running, Cancelled)
            | (Failed, Queued)
            | (Timeout, Queued)
    )
}

/// Compute the field updates for `transition`, or reject it.
pub fn plan(job: &Job, transition: Transition, now_ms: u64) -> Result<JobPatch, TransitionError> {
    let to = transition.target();
    if !transition.allowed_from(job.status) {
        return Err(TransitionError::InvalidTransition { id: job.id.clone(), from: job.status, to });
    }

    let mut patch = JobPatch { status: Some(to), ..JobPatch::default() };
    match transition {
        Transition::Enqueue => {
            patch.queued_at_ms = Some(Some(now_ms));
        }
        Transition::Dispatch => {
            let deadline = now_ms.saturating_add(job.timeout_secs.saturating_mul(1000));
            patch.started_at_ms = Some(Some(now_ms));
            patch.timeout_at_ms = Some(Some(deadline));
        }
        Transition::Succeed { result } => {
            patch.progress = Some(100);
            patch.result = Some(Some(result));
            patch.error = Some(None);
            patch.completed_at_ms = Some(Some(now_ms));
        }
        Transition::Fail { error: reason } | Transition::TimeOut { reason } => {
            patch.attempts = Some(job.attempts.saturating_add(1).min(job.max_attempts));
            patch.error = Some(Some(reason));
            patch.completed_at_ms = Some(Some(now_ms));
        }
        Transition::Cancel { reason } => {
            patch.error = Some(Some(reason));
            patch.completed_at_ms = Some(Some(now_ms));
        }
        Transition::Requeue => {
            if job.attempts >= job.max_attempts {
                return Err(TransitionError::AttemptsExhausted {
                    id: job.id.clone(),
                    attempts: job.attempts,
                    max_attempts: job.max_attempts,
                });
            }
            // The last error stays visible until the next attempt finishes.
            patch.progress = Some(0);
            patch.status_text = Some(None);
            patch.queued_at_ms = Some(Some(now_ms));
            patch.started_at_ms = Some(None);
            patch.timeout_at_ms = Some(None);
            patch.completed_at_ms = Some(None);
        }
    }
    Ok(patch)
}

/// Plan and apply `transition` in place, returning the event to publish.
pub fn advance(
    job: &mut Job,
    transition: Transition,
    now_ms: u64,
) -> Result<TransitionEvent, TransitionError> {
    let from = job.status;
    let attempt = job.attempt();
    let patch = plan(job, transition, now_ms)?;
    patch.apply(job);
    Ok(TransitionEvent { job_id: job.id.clone(), from, to: job.status, attempt, at_ms: now_ms })
}

/// Plan an executor progress report.
///
/// Only accepted while running. Values above 100 are clamped and a lower
/// percentage than already recorded is kept at the recorded value. Returns
/// `None` when nothing would change.
pub fn plan_progress(
    job: &Job,
    percent: u8,
    text: Option<String>,
) -> Result<Option<JobPatch>, TransitionError> {
    if job.status != JobStatus::Running {
        return Err(TransitionError::NotRunning { id: job.id.clone(), status: job.status });
    }
    let progress = percent.min(100).max(job.progress);
    let mut patch = JobPatch::default();
    if progress != job.progress {
        patch.progress = Some(progress);
    }
    if text.is_some() && text != job.status_text {
        patch.status_text = Some(text);
    }
    Ok((!patch.is_empty()).then_some(patch))
}

/// Plan a batch parent's rolled-up progress.
///
/// Parents are never `running`, so this bypasses the executor rule and only
/// refuses terminal parents. Progress never decreases.
pub fn plan_batch_progress(job: &Job, percent: u8) -> Option<JobPatch> {
    let progress = percent.min(100);
    if job.is_terminal() || progress <= job.progress {
        return None;
    }
    Some(JobPatch { progress: Some(progress), ..JobPatch::default() })
}

#[cfg(test)]
#[path = "transition_tests.rs"]
mod tests;
