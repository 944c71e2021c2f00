// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker pool: claims jobs and drives executors.
//!
//! The pool polls [`Engine::claim_next_matching`] for the job types it has
//! executors for, with at most `concurrency` attempts in flight. Transition
//! events wake it early (a job was queued, a slot freed up) and tell it when
//! a job left `running` under an executor, which cancels that execution.
//!
//! Executions are fenced by attempt number: events and reports from an
//! earlier attempt never touch the execution of a retry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use spindle_core::{Clock, Failure, Job, JobId, JobKind, JobStatus, TransitionEvent};
use spindle_storage::JobStore;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::WorkerConfig;
use crate::engine::Engine;
use crate::executor::{ExecContext, Executor, ExecutorSet, Progress};

/// One in-flight execution.
#[derive(Debug, Clone)]
struct Run {
    attempt: u32,
    cancel: CancellationToken,
}

type Active = Arc<Mutex<HashMap<JobId, Run>>>;

/// Caller-level pause: a paused pool stops claiming new jobs but lets
/// in-flight executions finish.
#[derive(Debug, Clone, Default)]
pub struct PauseHandle(Arc<AtomicBool>);

impl PauseHandle {
    pub fn pause(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct WorkerPool<S: JobStore, C: Clock> {
    engine: Arc<Engine<S, C>>,
    executors: ExecutorSet,
    concurrency: usize,
    poll_interval: Duration,
    paused: PauseHandle,
}

impl<S: JobStore, C: Clock> WorkerPool<S, C> {
    pub fn new(engine: Arc<Engine<S, C>>, executors: ExecutorSet, config: &WorkerConfig) -> Self {
        Self {
            engine,
            executors,
            concurrency: config.concurrency.max(1),
            poll_interval: config.poll_interval,
            paused: PauseHandle::default(),
        }
    }

    pub fn pause_handle(&self) -> PauseHandle {
        self.paused.clone()
    }

    /// Run until `shutdown` fires, then cancel in-flight executions and wait
    /// for them to report.
    pub async fn run(self, shutdown: CancellationToken) {
        let kinds = self.executors.kinds();
        if kinds.is_empty() {
            warn!("no executors configured, worker pool is idle");
            shutdown.cancelled().await;
            return;
        }

        let slots = Arc::new(Semaphore::new(self.concurrency));
        let active: Active = Arc::default();
        let mut events = self.engine.subscribe();
        let mut tasks = JoinSet::new();
        info!(concurrency = self.concurrency, kinds = ?kinds, "worker pool started");

        loop {
            if !self.paused.is_paused() {
                self.fill_slots(&kinds, &slots, &active, &shutdown, &mut tasks);
            }
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
                event = events.recv() => match event {
                    Ok(event) => stop_if_left_running(&event, &active),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "worker pool fell behind transition events");
                        self.reconcile(&active);
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        let in_flight: Vec<CancellationToken> =
            active.lock().values().map(|run| run.cancel.clone()).collect();
        for token in in_flight {
            token.cancel();
        }
        while tasks.join_next().await.is_some() {}
        info!("worker pool stopped");
    }

    fn fill_slots(
        &self,
        kinds: &[JobKind],
        slots: &Arc<Semaphore>,
        active: &Active,
        shutdown: &CancellationToken,
        tasks: &mut JoinSet<()>,
    ) {
        loop {
            let Ok(permit) = Arc::clone(slots).try_acquire_owned() else {
                return;
            };
            let job = match self.engine.claim_next_matching(kinds) {
                Ok(Some(job)) => job,
                Ok(None) => return,
                Err(e) => {
                    warn!(error = %e, "failed to claim job");
                    return;
                }
            };
            let executor = match self.executors.get(job.kind) {
                Ok(executor) => executor,
                Err(e) => {
                    let failure = Failure::fatal(e.to_string());
                    if let Err(e) = self.engine.report_attempt_failure(&job.id, job.attempt(), failure) {
                        warn!(job_id = %job.id, error = %e, "failed to report missing executor");
                    }
                    continue;
                }
            };

            let cancel = shutdown.child_token();
            let run = Run { attempt: job.attempt(), cancel: cancel.clone() };
            if let Some(previous) = active.lock().insert(job.id.clone(), run) {
                // Re-claimed, so the earlier attempt is no longer running.
                previous.cancel.cancel();
            }
            tasks.spawn(run_job(
                Arc::clone(&self.engine),
                executor,
                job,
                cancel,
                shutdown.clone(),
                Arc::clone(active),
                permit,
            ));
        }
    }

    /// After missing events, cancel executions whose attempt is no longer
    /// the one running.
    fn reconcile(&self, active: &Active) {
        for (id, run) in active.lock().iter() {
            match self.engine.get_job(id) {
                Ok(job) if job.status == JobStatus::Running && job.attempt() == run.attempt => {}
                _ => run.cancel.cancel(),
            }
        }
    }
}

fn stop_if_left_running(event: &TransitionEvent, active: &Active) {
    if !event.left_running() {
        return;
    }
    if let Some(run) = active.lock().get(&event.job_id) {
        if run.attempt == event.attempt && !run.cancel.is_cancelled() {
            debug!(
                job_id = %event.job_id,
                attempt = run.attempt,
                to = %event.to,
                "job left running, stopping executor"
            );
            run.cancel.cancel();
        }
    }
}

async fn run_job<S: JobStore, C: Clock>(
    engine: Arc<Engine<S, C>>,
    executor: Arc<dyn Executor>,
    job: Job,
    cancel: CancellationToken,
    shutdown: CancellationToken,
    active: Active,
    _permit: OwnedSemaphorePermit,
) {
    let id = job.id.clone();
    let attempt = job.attempt();
    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<Progress>();

    let forward = {
        let engine = Arc::clone(&engine);
        let id = id.clone();
        tokio::spawn(async move {
            while let Some(progress) = progress_rx.recv().await {
                if let Err(e) =
                    engine.report_attempt_progress(&id, attempt, progress.percent, progress.text)
                {
                    if !e.is_stale_report() {
                        warn!(job_id = %id, error = %e, "failed to record progress");
                    }
                }
            }
        })
    };

    info!(job_id = %id, kind = %job.kind, attempt, "executing job");
    let outcome = executor.execute(job, ExecContext::new(cancel, progress_tx)).await;
    let _ = forward.await;

    let report = match outcome {
        Ok(result) => engine.report_attempt_success(&id, attempt, result),
        Err(_) if shutdown.is_cancelled() => {
            engine.report_attempt_failure(&id, attempt, Failure::retryable("worker pool shut down"))
        }
        Err(failure) => engine.report_attempt_failure(&id, attempt, failure),
    };
    match report {
        Ok(job) => debug!(job_id = %id, status = %job.status, "execution reported"),
        // Cancelled, timed out or retried while the executor was still working
        Err(e) if e.is_stale_report() => {
            debug!(job_id = %id, attempt, "job moved on before the executor finished")
        }
        Err(e) => warn!(job_id = %id, error = %e, "failed to report execution outcome"),
    }

    let mut runs = active.lock();
    if runs.get(&id).is_some_and(|run| run.attempt == attempt) {
        runs.remove(&id);
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
