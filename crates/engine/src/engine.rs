// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The engine: caller-facing job operations over a [`JobStore`].
//!
//! Every mutation follows the same shape: take the job's lock, re-read the
//! record, plan the transition through the state machine, persist the whole
//! record, release the lock, then publish events. No lock is held while an
//! executor runs or while listeners are called.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::Value;
use spindle_core::transition::advance;
use spindle_core::{
    Clock, Failure, Job, JobFilter, JobId, JobKind, JobOrder, JobSpec, JobStats, JobStatus,
    Transition, TransitionError, TransitionEvent, ValidationError,
};
use spindle_storage::{JobStore, StoreError};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::emitter::{EventEmitter, ListenerId};
use crate::error::EngineError;
use crate::locks::JobLocks;
use crate::recovery::RecoveryReport;
use crate::retry::land_failure;

pub struct Engine<S: JobStore, C: Clock> {
    pub(crate) store: S,
    pub(crate) clock: C,
    config: EngineConfig,
    pub(crate) locks: JobLocks,
    emitter: EventEmitter,
    next_seq: AtomicU64,
}

impl<S: JobStore, C: Clock> Engine<S, C> {
    /// Open the engine over `store` and run the Recovery Procedure.
    ///
    /// Nothing can be claimed before recovery has finished, since the engine
    /// is only handed out afterwards.
    pub fn open(
        store: S,
        clock: C,
        config: EngineConfig,
    ) -> Result<(Self, RecoveryReport), EngineError> {
        let last_seq = store
            .query(&JobFilter::default(), JobOrder::CreatedAsc)?
            .iter()
            .map(|job| job.seq)
            .max()
            .unwrap_or(0);

        let engine = Self {
            store,
            clock,
            config,
            locks: JobLocks::default(),
            emitter: EventEmitter::default(),
            next_seq: AtomicU64::new(last_seq + 1),
        };
        let report = engine.recover()?;
        Ok((engine, report))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A job description carrying the configured defaults.
    pub fn spec(&self, kind: JobKind) -> JobSpec {
        self.config.spec(kind)
    }

    // ── Creation ────────────────────────────────────────────────────────

    /// Validate and persist a new `created` job.
    pub fn create_job(&self, spec: JobSpec) -> Result<JobId, EngineError> {
        spec.validate()?;
        let id = JobId::generate();

        let job = match spec.parent_job_id.clone() {
            // Hold the parent's lock so concurrent creations can't overfill it.
            Some(parent) => {
                let _guard = self.locks.lock(&parent);
                self.check_parent(&id, &parent)?;
                self.insert(id, spec)?
            }
            None => self.insert(id, spec)?,
        };

        info!(
            job_id = %job.id,
            kind = %job.kind,
            priority = job.priority,
            parent = job.parent_job_id.as_ref().map(|p| p.as_str()),
            batch_size = job.batch_size,
            "created job"
        );
        Ok(job.id)
    }

    /// Create a batch parent that expects `size` children.
    pub fn create_batch(&self, spec: JobSpec, size: u32) -> Result<JobId, EngineError> {
        self.create_job(spec.batch_size(size))
    }

    /// Create and immediately enqueue.
    pub fn submit(&self, spec: JobSpec) -> Result<JobId, EngineError> {
        let id = self.create_job(spec)?;
        self.enqueue(&id)?;
        Ok(id)
    }

    fn insert(&self, id: JobId, spec: JobSpec) -> Result<Job, EngineError> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let job = Job::new(id, spec, seq, self.clock.epoch_ms());
        self.store.put(&job)?;
        Ok(job)
    }

    // ── Transitions ─────────────────────────────────────────────────────

    /// `created -> queued`. Children of a finished batch stay `created`.
    pub fn enqueue(&self, id: &JobId) -> Result<Job, EngineError> {
        let (job, _) = self.with_job(id, |job, now| {
            self.check_parent_open(job)?;
            Ok(vec![advance(job, Transition::Enqueue, now)?])
        })?;
        Ok(job)
    }

    /// Record executor progress. Only accepted while the job is running.
    pub fn report_progress(
        &self,
        id: &JobId,
        percent: u8,
        text: Option<String>,
    ) -> Result<Job, EngineError> {
        self.record_progress(id, None, percent, text)
    }

    /// `running -> completed`
    pub fn report_success(&self, id: &JobId, result: Value) -> Result<Job, EngineError> {
        self.record_success(id, None, result)
    }

    /// `running -> failed`, then the Retry Policy, in one write.
    ///
    /// Plain strings are retryable; use [`Failure::fatal`] for errors that
    /// will not go away on another attempt.
    pub fn report_failure(
        &self,
        id: &JobId,
        failure: impl Into<Failure>,
    ) -> Result<Job, EngineError> {
        self.record_failure(id, None, failure.into())
    }

    /// [`Engine::report_progress`] on behalf of one attempt.
    ///
    /// Rejected with [`TransitionError::StaleAttempt`] once the job has
    /// moved on to a later attempt.
    pub fn report_attempt_progress(
        &self,
        id: &JobId,
        attempt: u32,
        percent: u8,
        text: Option<String>,
    ) -> Result<Job, EngineError> {
        self.record_progress(id, Some(attempt), percent, text)
    }

    /// [`Engine::report_success`] on behalf of one attempt.
    pub fn report_attempt_success(
        &self,
        id: &JobId,
        attempt: u32,
        result: Value,
    ) -> Result<Job, EngineError> {
        self.record_success(id, Some(attempt), result)
    }

    /// [`Engine::report_failure`] on behalf of one attempt.
    pub fn report_attempt_failure(
        &self,
        id: &JobId,
        attempt: u32,
        failure: impl Into<Failure>,
    ) -> Result<Job, EngineError> {
        self.record_failure(id, Some(attempt), failure.into())
    }

    fn record_progress(
        &self,
        id: &JobId,
        attempt: Option<u32>,
        percent: u8,
        text: Option<String>,
    ) -> Result<Job, EngineError> {
        let (job, _) = self.with_job(id, |job, _| {
            check_attempt(job, attempt)?;
            if let Some(patch) = spindle_core::transition::plan_progress(job, percent, text)? {
                patch.apply(job);
            }
            Ok(Vec::new())
        })?;
        Ok(job)
    }

    fn record_success(
        &self,
        id: &JobId,
        attempt: Option<u32>,
        result: Value,
    ) -> Result<Job, EngineError> {
        let (job, _) = self.with_job(id, |job, now| {
            check_attempt(job, attempt)?;
            Ok(vec![advance(job, Transition::Succeed { result }, now)?])
        })?;
        Ok(job)
    }

    fn record_failure(
        &self,
        id: &JobId,
        attempt: Option<u32>,
        failure: Failure,
    ) -> Result<Job, EngineError> {
        let kind = failure.kind();
        let (job, _) = self.with_job(id, |job, now| {
            check_attempt(job, attempt)?;
            Ok(land_failure(job, Transition::fail(failure.message), kind, now)?)
        })?;
        Ok(job)
    }

    /// `queued|running -> cancelled`. Cancelling a batch cancels its
    /// queued and running children.
    pub fn cancel(&self, id: &JobId) -> Result<Job, EngineError> {
        let (job, _) = self.with_job(id, |job, now| Ok(vec![advance(job, Transition::cancel(), now)?]))?;

        if job.is_batch() {
            for child in self.children_of(&job.id)? {
                if !matches!(child.status, JobStatus::Queued | JobStatus::Running) {
                    continue;
                }
                match self.with_job(&child.id, |child, now| {
                    Ok(vec![advance(child, Transition::cancel(), now)?])
                }) {
                    Ok(_) => {}
                    // Finished between the query and the lock
                    Err(e) if e.is_stale_report() => {}
                    Err(e) => warn!(job_id = %child.id, error = %e, "failed to cancel batch child"),
                }
            }
        }
        Ok(job)
    }

    /// Manually re-queue a `failed`/`timeout` job that has attempts left.
    pub fn retry(&self, id: &JobId) -> Result<Job, EngineError> {
        let (job, _) = self.with_job(id, |job, now| {
            if job.is_batch() {
                // Parents re-run only through their children.
                return Err(TransitionError::InvalidTransition {
                    id: job.id.clone(),
                    from: job.status,
                    to: JobStatus::Queued,
                }
                .into());
            }
            self.check_parent_open(job)?;
            Ok(vec![advance(job, Transition::Requeue, now)?])
        })?;
        info!(job_id = %job.id, attempts = job.attempts, max_attempts = job.max_attempts, "manual retry");
        Ok(job)
    }

    fn check_parent_open(&self, job: &Job) -> Result<(), EngineError> {
        if let Some(parent_id) = &job.parent_job_id {
            let parent = self.store.get(parent_id)?;
            if parent.is_terminal() {
                return Err(ValidationError::ParentTerminal(parent_id.clone(), parent.status).into());
            }
        }
        Ok(())
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn get_job(&self, id: &JobId) -> Result<Job, EngineError> {
        Ok(self.store.get(id)?)
    }

    pub fn list_jobs(&self, filter: &JobFilter, order: JobOrder) -> Result<Vec<Job>, EngineError> {
        Ok(self.store.query(filter, order)?)
    }

    pub fn job_stats(&self) -> Result<JobStats, EngineError> {
        let jobs = self.store.query(&JobFilter::default(), JobOrder::default())?;
        Ok(JobStats::tally(&jobs))
    }

    /// Resolve a full id, or a unique prefix of the id or of its suffix.
    pub fn resolve_id(&self, prefix: &str) -> Result<JobId, EngineError> {
        let exact = JobId::from_string(prefix);
        if self.store.contains(&exact)? {
            return Ok(exact);
        }
        let mut matches: Vec<JobId> = self
            .store
            .query(&JobFilter::default(), JobOrder::CreatedAsc)?
            .into_iter()
            .filter(|job| job.id.as_str().starts_with(prefix) || job.id.suffix().starts_with(prefix))
            .map(|job| job.id)
            .collect();
        match matches.len() {
            0 => Err(EngineError::NotFound(exact)),
            1 => Ok(matches.remove(0)),
            n => Err(EngineError::AmbiguousId { prefix: prefix.to_string(), matches: n }),
        }
    }

    // ── Retention ───────────────────────────────────────────────────────

    /// Delete terminal jobs that finished more than `age` ago.
    ///
    /// Children go before parents; a parent is kept while any child
    /// survives, and a child is kept while its parent is still open.
    pub fn cleanup_older_than(&self, age: Duration) -> Result<Vec<JobId>, EngineError> {
        let now = self.clock.epoch_ms();
        let cutoff = now.saturating_sub(age.as_millis() as u64);
        // A child still `created` is finished once its batch is: it can no
        // longer be enqueued. The parent check below skips open batches.
        let finished = |job: &Job| {
            job.is_terminal() || (job.status == JobStatus::Created && job.parent_job_id.is_some())
        };
        let expired = |job: &Job| {
            finished(job) && job.completed_at_ms.unwrap_or(job.created_at_ms) < cutoff
        };

        let (parents, others): (Vec<Job>, Vec<Job>) = self
            .store
            .query(&JobFilter::default(), JobOrder::CreatedAsc)?
            .into_iter()
            .filter(|job| expired(job))
            .partition(|job| job.is_batch());

        let mut removed = Vec::new();
        for candidate in others.iter().chain(parents.iter()) {
            let _guard = self.locks.lock(&candidate.id);
            let job = match self.store.get(&candidate.id) {
                Ok(job) => job,
                Err(StoreError::NotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            };
            // Re-check: a manual retry may have revived it.
            if !expired(&job) {
                continue;
            }
            if let Some(parent_id) = &job.parent_job_id {
                match self.store.get(parent_id) {
                    Ok(parent) if !parent.is_terminal() => continue,
                    Ok(_) | Err(StoreError::NotFound(_)) => {}
                    Err(e) => return Err(e.into()),
                }
            }
            if job.is_batch() && !self.children_of(&job.id)?.is_empty() {
                debug!(job_id = %job.id, "keeping batch with surviving children");
                continue;
            }
            self.store.delete(&job.id)?;
            removed.push(job.id);
        }

        info!(removed = removed.len(), cutoff_ms = cutoff, "retention cleanup");
        Ok(removed)
    }

    // ── Subscription ────────────────────────────────────────────────────

    /// Register a callback for every accepted transition.
    pub fn on_transition<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&TransitionEvent) + Send + Sync + 'static,
    {
        self.emitter.on_transition(callback)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.emitter.remove_listener(id)
    }

    /// Async receiver of transition events.
    pub fn subscribe(&self) -> broadcast::Receiver<TransitionEvent> {
        self.emitter.subscribe()
    }

    // ── Internals ───────────────────────────────────────────────────────

    /// Locked read-modify-write of one job.
    ///
    /// `update` mutates the job in place and returns the events to publish.
    /// The record is written only if it changed. When the job lands in a
    /// terminal status as a batch child, the parent is refreshed afterwards.
    pub(crate) fn with_job<F>(
        &self,
        id: &JobId,
        update: F,
    ) -> Result<(Job, Vec<TransitionEvent>), EngineError>
    where
        F: FnOnce(&mut Job, u64) -> Result<Vec<TransitionEvent>, EngineError>,
    {
        let (job, events) = {
            let _guard = self.locks.lock(id);
            let mut job = self.store.get(id)?;
            let before = job.clone();
            let events = update(&mut job, self.clock.epoch_ms())?;
            if job != before {
                self.store.put(&job)?;
            }
            (job, events)
        };

        self.emitter.publish(&events);

        if !events.is_empty() && job.is_terminal() {
            if let Some(parent) = &job.parent_job_id {
                if let Err(e) = self.refresh_batch(parent) {
                    // Recovery refreshes every open batch on the next start.
                    warn!(job_id = %job.id, parent = %parent, error = %e, "batch refresh failed");
                }
            }
        }
        Ok((job, events))
    }
}

/// Reject a report from an attempt the running job has moved past.
fn check_attempt(job: &Job, attempt: Option<u32>) -> Result<(), TransitionError> {
    match attempt {
        Some(attempt) if job.status == JobStatus::Running && job.attempt() != attempt => {
            Err(TransitionError::StaleAttempt { id: job.id.clone(), attempt, current: job.attempt() })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
