// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use spindle_core::transition::DEADLINE_EXCEEDED;
use spindle_core::{JobKind, SystemClock};
use spindle_storage::MemoryStore;

use crate::config::EngineConfig;
use crate::testing::{engine, record, spec, start};

#[test]
fn overdue_job_times_out_and_is_requeued() {
    let (engine, clock) = engine();
    let id = start(&engine, spec(JobKind::Analyze).timeout_secs(30));
    let log = record(&engine);

    clock.advance(Duration::from_secs(31));
    assert_eq!(engine.tick_timeouts().unwrap(), vec![id.clone()]);

    let job = engine.get_job(&id).unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.attempts, 1);
    assert_eq!(job.error.as_deref(), Some(DEADLINE_EXCEEDED));
    assert!(job.timeout_at_ms.is_none());

    let seen: Vec<_> = log.lock().iter().map(|(_, from, to)| (*from, *to)).collect();
    assert_eq!(
        seen,
        vec![(JobStatus::Running, JobStatus::Timeout), (JobStatus::Timeout, JobStatus::Queued)]
    );
}

#[test]
fn deadline_itself_is_not_overdue() {
    let (engine, clock) = engine();
    let id = start(&engine, spec(JobKind::Analyze).timeout_secs(30));

    clock.advance(Duration::from_secs(30));
    assert!(engine.tick_timeouts().unwrap().is_empty());
    assert_eq!(engine.get_job(&id).unwrap().status, JobStatus::Running);

    clock.advance(Duration::from_millis(1));
    assert_eq!(engine.tick_timeouts().unwrap(), vec![id]);
}

#[test]
fn last_attempt_stays_timed_out() {
    let (engine, clock) = engine();
    let id = start(&engine, spec(JobKind::StemSeparation).timeout_secs(5).max_attempts(1));

    clock.advance(Duration::from_secs(6));
    engine.tick_timeouts().unwrap();

    let job = engine.get_job(&id).unwrap();
    assert_eq!(job.status, JobStatus::Timeout);
    assert_eq!(job.attempts, 1);
    assert!(engine.claim_next().unwrap().is_none());
}

#[test]
fn finished_jobs_are_left_alone() {
    let (engine, clock) = engine();
    let done = start(&engine, spec(JobKind::Scan).timeout_secs(1));
    engine.report_success(&done, json!({})).unwrap();
    let _queued = engine.submit(spec(JobKind::Scan).timeout_secs(1)).unwrap();

    clock.advance(Duration::from_secs(60));
    assert!(engine.tick_timeouts().unwrap().is_empty());
    assert_eq!(engine.get_job(&done).unwrap().status, JobStatus::Completed);
}

#[test]
fn late_success_after_timeout_is_stale() {
    let (engine, clock) = engine();
    let id = start(&engine, spec(JobKind::Analyze).timeout_secs(1).max_attempts(1));
    clock.advance(Duration::from_secs(2));
    engine.tick_timeouts().unwrap();

    let err = engine.report_success(&id, json!({"bpm": 120})).unwrap_err();
    assert!(err.is_stale_report());
    assert_eq!(engine.get_job(&id).unwrap().status, JobStatus::Timeout);
}

#[tokio::test]
async fn monitor_loop_times_out_jobs_until_shutdown() {
    let (engine, _) = Engine::open(MemoryStore::new(), SystemClock, EngineConfig::default()).unwrap();
    let engine = Arc::new(engine);
    let id = engine.submit(engine.spec(JobKind::Analyze).timeout_secs(1).max_attempts(1)).unwrap();
    engine.claim_next().unwrap();

    let shutdown = CancellationToken::new();
    let handle =
        spawn_timeout_monitor(Arc::clone(&engine), Duration::from_millis(50), shutdown.clone());

    let mut status = JobStatus::Running;
    for _ in 0..200 {
        status = engine.get_job(&id).unwrap().status;
        if status == JobStatus::Timeout {
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    assert_eq!(status, JobStatus::Timeout);

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
}
