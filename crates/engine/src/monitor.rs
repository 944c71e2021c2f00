// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timeout Monitor.
//!
//! The only component that moves jobs to `timeout`. Executors are never
//! trusted to report their own deadline since they may be unresponsive.

use std::sync::Arc;
use std::time::Duration;

use spindle_core::{Clock, FailureKind, JobFilter, JobId, JobOrder, JobStatus, Transition};
use spindle_storage::JobStore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::engine::Engine;
use crate::error::EngineError;
use crate::retry::land_failure;

impl<S: JobStore, C: Clock> Engine<S, C> {
    /// Time out every running job whose deadline is strictly in the past.
    ///
    /// Returns the ids that were timed out (some may already be re-queued).
    pub fn tick_timeouts(&self) -> Result<Vec<JobId>, EngineError> {
        let now = self.clock.epoch_ms();
        let overdue: Vec<JobId> = self
            .store
            .query(&JobFilter::status(JobStatus::Running), JobOrder::CreatedAsc)?
            .into_iter()
            .filter(|job| job.is_overdue(now))
            .map(|job| job.id)
            .collect();

        let mut timed_out = Vec::new();
        for id in overdue {
            let result = self.with_job(&id, |job, now| {
                // Completed or cancelled since the scan
                if !job.is_overdue(now) {
                    return Ok(Vec::new());
                }
                Ok(land_failure(job, Transition::timeout(), FailureKind::Timeout, now)?)
            });
            match result {
                Ok((_, events)) if !events.is_empty() => timed_out.push(id),
                Ok(_) | Err(EngineError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(timed_out)
    }
}

/// Run [`Engine::tick_timeouts`] every `interval` until `shutdown` fires.
pub fn spawn_timeout_monitor<S, C>(
    engine: Arc<Engine<S, C>>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()>
where
    S: JobStore,
    C: Clock,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::debug!(interval_ms = interval.as_millis() as u64, "timeout monitor started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => match engine.tick_timeouts() {
                    Ok(ids) if !ids.is_empty() => {
                        tracing::info!(count = ids.len(), "timed out overdue jobs");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "timeout check failed"),
                },
            }
        }
        tracing::debug!("timeout monitor stopped");
    })
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
