// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed field updates produced by the state machine.
//!
//! A `JobPatch` names exactly the mutable fields of a [`Job`]. `None` leaves
//! a field untouched; for optional fields `Some(None)` clears it.

use serde_json::Value;

use crate::job::{Job, JobStatus};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub progress: Option<u8>,
    pub status_text: Option<Option<String>>,
    pub result: Option<Option<Value>>,
    pub error: Option<Option<String>>,
    pub attempts: Option<u32>,
    pub queued_at_ms: Option<Option<u64>>,
    pub started_at_ms: Option<Option<u64>>,
    pub timeout_at_ms: Option<Option<u64>>,
    pub completed_at_ms: Option<Option<u64>>,
}

impl JobPatch {
    pub fn is_empty(&self) -> bool {
        *self == JobPatch::default()
    }

    pub fn apply(self, job: &mut Job) {
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(progress) = self.progress {
            job.progress = progress;
        }
        if let Some(text) = self.status_text {
            job.status_text = text;
        }
        if let Some(result) = self.result {
            job.result = result;
        }
        if let Some(error) = self.error {
            job.error = error;
        }
        if let Some(attempts) = self.attempts {
            job.attempts = attempts;
        }
        if let Some(at) = self.queued_at_ms {
            job.queued_at_ms = at;
        }
        if let Some(at) = self.started_at_ms {
            job.started_at_ms = at;
        }
        if let Some(at) = self.timeout_at_ms {
            job.timeout_at_ms = at;
        }
        if let Some(at) = self.completed_at_ms {
            job.completed_at_ms = at;
        }
    }
}
