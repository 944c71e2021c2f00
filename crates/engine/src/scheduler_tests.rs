// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use spindle_core::test_support::strategies::arb_schedule;
use spindle_core::{Clock, JobKind, JobStatus};

use crate::testing::{engine, spec};

#[test]
fn empty_queue_claims_nothing() {
    let (engine, _) = engine();
    assert!(engine.claim_next().unwrap().is_none());
    engine.create_job(spec(JobKind::Scan)).unwrap();
    assert!(engine.claim_next().unwrap().is_none(), "created jobs are not queued");
}

#[test]
fn priority_then_age_decides_the_order() {
    let (engine, clock) = engine();
    clock.set_epoch_ms(1_000);
    let a = engine.submit(spec(JobKind::Analyze).priority(5)).unwrap();
    clock.set_epoch_ms(2_000);
    let b = engine.submit(spec(JobKind::Analyze).priority(1)).unwrap();
    clock.set_epoch_ms(3_000);
    let c = engine.submit(spec(JobKind::Analyze).priority(1)).unwrap();

    let order: Vec<_> = std::iter::from_fn(|| engine.claim_next().unwrap()).map(|job| job.id).collect();
    assert_eq!(order, vec![b, c, a]);
}

#[test]
fn same_instant_falls_back_to_submission_order() {
    let (engine, _) = engine();
    let ids: Vec<_> = (0..5).map(|_| engine.submit(spec(JobKind::TagWrite)).unwrap()).collect();
    let order: Vec<_> = std::iter::from_fn(|| engine.claim_next().unwrap()).map(|job| job.id).collect();
    assert_eq!(order, ids);
}

#[test]
fn claim_sets_start_and_deadline() {
    let (engine, clock) = engine();
    engine.submit(spec(JobKind::Scan).timeout_secs(30)).unwrap();
    let job = engine.claim_next().unwrap().unwrap();

    assert_eq!(job.status, JobStatus::Running);
    assert_eq!(job.started_at_ms, Some(clock.epoch_ms()));
    assert_eq!(job.timeout_at_ms, Some(clock.epoch_ms() + 30_000));
}

#[test]
fn batch_parents_are_never_dispatched() {
    let (engine, _) = engine();
    let parent = engine.create_batch(spec(JobKind::BatchAnalyze).priority(1), 1).unwrap();
    engine.enqueue(&parent).unwrap();
    let child = engine
        .submit(spec(JobKind::BatchAnalyze).priority(9).parent_job_id(parent.clone()))
        .unwrap();

    assert_eq!(engine.claim_next().unwrap().map(|job| job.id), Some(child));
    assert!(engine.claim_next().unwrap().is_none());
    assert_eq!(engine.get_job(&parent).unwrap().status, JobStatus::Queued);
}

#[test]
fn kind_filter_skips_other_types() {
    let (engine, _) = engine();
    let _scan = engine.submit(spec(JobKind::Scan).priority(1)).unwrap();
    let export = engine.submit(spec(JobKind::Export).priority(9)).unwrap();

    let job = engine.claim_next_matching(&[JobKind::Export, JobKind::TagWrite]).unwrap().unwrap();
    assert_eq!(job.id, export);
    assert!(engine.claim_next_matching(&[JobKind::Export]).unwrap().is_none());
    assert_eq!(engine.claim_next().unwrap().unwrap().kind, JobKind::Scan);
}

#[test]
fn concurrent_claims_never_share_a_job() {
    let (engine, _) = engine();
    let engine = Arc::new(engine);
    let submitted: HashSet<_> =
        (0..40).map(|_| engine.submit(spec(JobKind::Analyze)).unwrap()).collect();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let mut mine = Vec::new();
                while let Some(job) = engine.claim_next().unwrap() {
                    mine.push(job.id);
                }
                mine
            })
        })
        .collect();

    let mut claimed = Vec::new();
    for handle in handles {
        claimed.extend(handle.join().unwrap());
    }
    let unique: HashSet<_> = claimed.iter().cloned().collect();
    assert_eq!(claimed.len(), 40, "every job claimed exactly once");
    assert_eq!(unique, submitted);
    assert_eq!(engine.job_stats().unwrap().running, 40);
}

proptest! {
    #[test]
    fn dispatch_order_is_priority_created_seq(schedule in arb_schedule(24)) {
        let (engine, clock) = engine();
        let mut expected = Vec::new();
        for (priority, created_at) in &schedule {
            clock.set_epoch_ms(*created_at);
            let id = engine.submit(spec(JobKind::Analyze).priority(*priority)).unwrap();
            let seq = engine.get_job(&id).unwrap().seq;
            expected.push((*priority, *created_at, seq, id));
        }
        expected.sort();

        let order: Vec<_> = std::iter::from_fn(|| engine.claim_next().unwrap()).map(|job| job.id).collect();
        let expected: Vec<_> = expected.into_iter().map(|(_, _, _, id)| id).collect();
        prop_assert_eq!(order, expected);
    }
}
