// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery Procedure, run once by [`Engine::open`].
//!
//! A crash can leave jobs `running` with no executor behind them. Each one
//! is failed as interrupted and handed to the Retry Policy. Open batches are
//! then re-aggregated in case a child finished right before the crash.

use serde::{Deserialize, Serialize};
use spindle_core::transition::INTERRUPTED;
use spindle_core::{Clock, FailureKind, JobFilter, JobId, JobOrder, JobStatus, Transition};
use spindle_storage::JobStore;

use crate::engine::Engine;
use crate::error::EngineError;
use crate::retry::land_failure;

/// What recovery changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryReport {
    /// Jobs found `running` and failed as interrupted
    pub interrupted: Vec<JobId>,
    /// Subset of `interrupted` put back in the queue
    pub requeued: Vec<JobId>,
    /// Batch parents that reached their outcome during recovery
    pub batches_finalized: Vec<JobId>,
}

impl RecoveryReport {
    pub fn is_empty(&self) -> bool {
        self.interrupted.is_empty() && self.batches_finalized.is_empty()
    }
}

impl<S: JobStore, C: Clock> Engine<S, C> {
    pub(crate) fn recover(&self) -> Result<RecoveryReport, EngineError> {
        let mut report = RecoveryReport::default();

        let running = self.store.query(&JobFilter::status(JobStatus::Running), JobOrder::CreatedAsc)?;
        for stuck in running {
            let (job, events) = self.with_job(&stuck.id, |job, now| {
                if job.status != JobStatus::Running {
                    return Ok(Vec::new());
                }
                Ok(land_failure(job, Transition::fail(INTERRUPTED), FailureKind::Interrupted, now)?)
            })?;
            if events.is_empty() {
                continue;
            }
            if job.status == JobStatus::Queued {
                report.requeued.push(job.id.clone());
            }
            report.interrupted.push(job.id);
        }

        let open_batches: Vec<JobId> = self
            .store
            .query(&JobFilter::default(), JobOrder::CreatedAsc)?
            .into_iter()
            .filter(|job| job.is_batch() && !job.is_terminal())
            .map(|job| job.id)
            .collect();
        for parent in open_batches {
            if self.refresh_batch(&parent)?.is_terminal() {
                report.batches_finalized.push(parent);
            }
        }

        if report.is_empty() {
            tracing::debug!("recovery: nothing to do");
        } else {
            tracing::info!(
                interrupted = report.interrupted.len(),
                requeued = report.requeued.len(),
                batches_finalized = report.batches_finalized.len(),
                "recovery complete"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
