// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler: atomic claim of the next queued job.

use spindle_core::transition::advance;
use spindle_core::{Clock, Job, JobFilter, JobKind, JobOrder, JobStatus, Transition};
use spindle_storage::JobStore;

use crate::engine::Engine;
use crate::error::EngineError;

impl<S: JobStore, C: Clock> Engine<S, C> {
    /// Claim the next queued job of any type.
    pub fn claim_next(&self) -> Result<Option<Job>, EngineError> {
        self.claim_next_matching(&[])
    }

    /// Claim the next queued job whose type is in `kinds` (empty = any).
    ///
    /// Candidates are visited in `(priority, created_at, seq)` order. Each is
    /// re-checked under its own lock before dispatch, so two concurrent
    /// callers can never claim the same job; a caller that loses the race
    /// moves on to the next candidate. Never blocks waiting for work.
    pub fn claim_next_matching(&self, kinds: &[JobKind]) -> Result<Option<Job>, EngineError> {
        let filter = JobFilter {
            statuses: vec![JobStatus::Queued],
            exclude_batches: true,
            ..JobFilter::default()
        }
        .with_kinds(kinds);

        for candidate in self.store.query(&filter, JobOrder::Scheduling)? {
            let claimed = self.with_job(&candidate.id, |job, now| {
                if job.status != JobStatus::Queued {
                    return Ok(Vec::new());
                }
                Ok(vec![advance(job, Transition::Dispatch, now)?])
            });
            match claimed {
                Ok((job, events)) if !events.is_empty() => {
                    tracing::debug!(
                        job_id = %job.id,
                        kind = %job.kind,
                        priority = job.priority,
                        attempt = job.attempt(),
                        "dispatched job"
                    );
                    return Ok(Some(job));
                }
                Ok(_) | Err(EngineError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
