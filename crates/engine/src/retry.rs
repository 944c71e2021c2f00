// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Applying the Retry Policy at a failure landing.

use spindle_core::retry::{self, RetryDecision};
use spindle_core::transition::advance;
use spindle_core::{FailureKind, Job, Transition, TransitionError, TransitionEvent};

/// Move a running job to `failed`/`timeout` and consult the Retry Policy.
///
/// When the policy approves, the job is re-queued in the same update, so
/// the caller persists both transitions with a single write and a crash can
/// never strand a retry-eligible job in `failed`.
pub(crate) fn land_failure(
    job: &mut Job,
    transition: Transition,
    kind: FailureKind,
    now_ms: u64,
) -> Result<Vec<TransitionEvent>, TransitionError> {
    let mut events = vec![advance(job, transition, now_ms)?];

    match retry::decide(job.attempts, job.max_attempts, kind) {
        RetryDecision::Requeue => {
            events.push(advance(job, Transition::Requeue, now_ms)?);
            tracing::info!(
                job_id = %job.id,
                %kind,
                attempts = job.attempts,
                max_attempts = job.max_attempts,
                error = job.error.as_deref(),
                "attempt failed, re-queued"
            );
        }
        RetryDecision::Exhausted => {
            tracing::warn!(
                job_id = %job.id,
                %kind,
                attempts = job.attempts,
                error = job.error.as_deref(),
                "attempts exhausted"
            );
        }
        RetryDecision::NotRetryable => {
            tracing::warn!(
                job_id = %job.id,
                %kind,
                error = job.error.as_deref(),
                "failure is not retryable"
            );
        }
    }
    Ok(events)
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
