// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::job::{Job, JobId, JobKind, JobStatus};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core state machine types.
pub mod strategies {
    use crate::job::JobStatus;
    use crate::transition::Transition;
    use proptest::prelude::*;

    pub fn arb_status() -> impl Strategy<Value = JobStatus> {
        prop::sample::select(JobStatus::ALL.to_vec())
    }

    pub fn arb_transition() -> impl Strategy<Value = Transition> {
        prop_oneof![
            Just(Transition::Enqueue),
            Just(Transition::Dispatch),
            Just(Transition::Succeed { result: serde_json::json!({"ok": true}) }),
            "[a-z ]{1,12}".prop_map(|error: String| Transition::Fail { error }),
            Just(Transition::timeout()),
            Just(Transition::cancel()),
            Just(Transition::Requeue),
        ]
    }

    /// `(priority, created_at_ms)` pairs for ordering properties.
    pub fn arb_schedule(max_len: usize) -> impl Strategy<Value = Vec<(u8, u64)>> {
        prop::collection::vec((1u8..=10, 0u64..50), 1..max_len)
    }
}

// ── Job factories ───────────────────────────────────────────────────────────

/// A job in `status` with the given id and priority.
pub fn job_in(id: &str, status: JobStatus) -> Job {
    Job::builder().id(JobId::from_string(id)).status(status).build()
}

/// A queued job ready for dispatch.
pub fn queued_job(id: &str, priority: u8, created_at_ms: u64, seq: u64) -> Job {
    Job::builder()
        .id(JobId::from_string(id))
        .status(JobStatus::Queued)
        .priority(priority)
        .created_at_ms(created_at_ms)
        .seq(seq)
        .queued_at_ms(created_at_ms)
        .build()
}

/// A running job whose deadline is `started_at_ms + timeout_secs`.
pub fn running_job(id: &str, started_at_ms: u64, timeout_secs: u64) -> Job {
    Job::builder()
        .id(JobId::from_string(id))
        .status(JobStatus::Running)
        .timeout_secs(timeout_secs)
        .started_at_ms(started_at_ms)
        .timeout_at_ms(started_at_ms + timeout_secs * 1000)
        .build()
}

/// A child of `parent` in `status`.
pub fn child_job(id: &str, parent: &str, status: JobStatus) -> Job {
    Job::builder()
        .id(JobId::from_string(id))
        .kind(JobKind::BatchAnalyze)
        .status(status)
        .parent_job_id(JobId::from_string(parent))
        .build()
}
