// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

#[test]
fn entries_are_pruned_after_release() {
    let locks = JobLocks::default();
    {
        let _a = locks.lock(&JobId::from_string("job-a"));
        let _b = locks.lock(&JobId::from_string("job-b"));
        assert_eq!(locks.len(), 2);
    }
    assert_eq!(locks.len(), 0);
}

#[test]
fn different_jobs_do_not_block_each_other() {
    let locks = JobLocks::default();
    let _a = locks.lock(&JobId::from_string("job-a"));
    // Would deadlock if the table were a single global lock.
    let _b = locks.lock(&JobId::from_string("job-b"));
}

#[test]
fn same_job_is_mutually_exclusive() {
    let locks = Arc::new(JobLocks::default());
    let inside = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let locks = Arc::clone(&locks);
            let inside = Arc::clone(&inside);
            let max_seen = Arc::clone(&max_seen);
            thread::spawn(move || {
                for _ in 0..20 {
                    let _guard = locks.lock(&JobId::from_string("job-shared"));
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_micros(50));
                    inside.fetch_sub(1, Ordering::SeqCst);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    assert_eq!(locks.len(), 0);
}
