// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job record, kinds and statuses.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::error::ValidationError;

crate::define_id! {
    /// Unique identifier for a job.
    ///
    /// Assigned by the engine at creation and never changed afterwards.
    pub struct JobId("job-");
}

/// Highest scheduling priority (explicit user action).
pub const PRIORITY_USER: u8 = 1;
/// Priority used when the caller does not pick one.
pub const PRIORITY_DEFAULT: u8 = 5;
/// Lowest scheduling priority (background maintenance).
pub const PRIORITY_BACKGROUND: u8 = 10;

/// Which executor processes a job. Opaque to the engine beyond routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    /// Walk library folders and import new tracks
    Scan,
    /// Analyze a single track (BPM, key, energy)
    Analyze,
    /// Batch analysis parent or child
    BatchAnalyze,
    /// Write a collection to DJ software formats
    Export,
    /// Separate a track into stems
    StemSeparation,
    /// Write tags back into audio files
    TagWrite,
    /// Maintenance (orphans, caches, retention)
    Cleanup,
}

impl JobKind {
    pub const ALL: [JobKind; 7] = [
        JobKind::Scan,
        JobKind::Analyze,
        JobKind::BatchAnalyze,
        JobKind::Export,
        JobKind::StemSeparation,
        JobKind::TagWrite,
        JobKind::Cleanup,
    ];
}

crate::simple_display! {
    JobKind {
        Scan => "scan",
        Analyze => "analyze",
        BatchAnalyze => "batch-analyze",
        Export => "export",
        StemSeparation => "stem-separation",
        TagWrite => "tag-write",
        Cleanup => "cleanup",
    }
}

impl FromStr for JobKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobKind::ALL
            .into_iter()
            .find(|kind| kind.to_string() == s)
            .ok_or_else(|| ValidationError::UnknownKind(s.to_string()))
    }
}

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Created,
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
    Timeout,
}

impl JobStatus {
    pub const ALL: [JobStatus; 7] = [
        JobStatus::Created,
        JobStatus::Queued,
        JobStatus::Running,
        JobStatus::Completed,
        JobStatus::Failed,
        JobStatus::Cancelled,
        JobStatus::Timeout,
    ];

    /// No automatic transition leaves this status.
    ///
    /// `Failed` and `Timeout` count as terminal because a retryable landing
    /// is re-queued in the same write; a job observed in either status has
    /// exhausted its attempts or failed fatally.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled | JobStatus::Timeout
        )
    }
}

crate::simple_display! {
    JobStatus {
        Created => "created",
        Queued => "queued",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
        Timeout => "timeout",
    }
}

impl FromStr for JobStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.to_string() == s)
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

/// A schedulable unit of asynchronous work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
    pub status: JobStatus,
    /// Lower value = scheduled earlier
    pub priority: u8,
    /// Interpreted only by the executor
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub attempts: u32,
    pub max_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_job_id: Option<JobId>,
    /// Declared child count; present only on batch parents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
    #[serde(default)]
    pub user_initiated: bool,
    pub timeout_secs: u64,
    /// Submission sequence within the store; FIFO tiebreaker
    #[serde(default)]
    pub seq: u64,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queued_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_at_ms: Option<u64>,
}

impl Job {
    /// Build a fresh `created` job from a validated spec.
    pub fn new(id: JobId, spec: JobSpec, seq: u64, created_at_ms: u64) -> Self {
        Self {
            id,
            kind: spec.kind,
            status: JobStatus::Created,
            priority: spec.priority,
            payload: spec.payload,
            progress: 0,
            status_text: None,
            result: None,
            error: None,
            attempts: 0,
            max_attempts: spec.max_attempts,
            parent_job_id: spec.parent_job_id,
            batch_size: spec.batch_size,
            user_initiated: spec.user_initiated,
            timeout_secs: spec.timeout_secs,
            seq,
            created_at_ms,
            queued_at_ms: None,
            started_at_ms: None,
            completed_at_ms: None,
            timeout_at_ms: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// True for parents whose outcome is derived from their children.
    pub fn is_batch(&self) -> bool {
        self.batch_size.is_some()
    }

    /// The attempt running now, or the one the next dispatch starts.
    ///
    /// `attempts` counts finished attempts, so a running job is on
    /// `attempts + 1`. Executor reports carry this number so a late report
    /// from an earlier attempt cannot land on a retry.
    pub fn attempt(&self) -> u32 {
        self.attempts.saturating_add(1)
    }

    /// Running with a deadline strictly before `now_ms`.
    pub fn is_overdue(&self, now_ms: u64) -> bool {
        self.status == JobStatus::Running
            && !self.is_batch()
            && self.timeout_at_ms.is_some_and(|deadline| deadline < now_ms)
    }
}

/// Caller-supplied description of a job to create.
///
/// Built with [`JobSpec::new`] and chained setters; checked by
/// [`JobSpec::validate`] before anything is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub kind: JobKind,
    pub priority: u8,
    pub payload: Value,
    pub user_initiated: bool,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub parent_job_id: Option<JobId>,
    pub batch_size: Option<u32>,
}

/// Upper bound for `max_attempts`; anything larger is a caller bug.
pub const MAX_ATTEMPTS_LIMIT: u32 = 100;

impl JobSpec {
    pub fn new(kind: JobKind) -> Self {
        Self {
            kind,
            priority: PRIORITY_DEFAULT,
            payload: Value::Null,
            user_initiated: false,
            timeout_secs: 3600,
            max_attempts: 3,
            parent_job_id: None,
            batch_size: None,
        }
    }

    crate::setters! {
        set {
            priority: u8,
            payload: Value,
            user_initiated: bool,
            timeout_secs: u64,
            max_attempts: u32,
        }
        option {
            parent_job_id: JobId,
            batch_size: u32,
        }
    }

    /// Check the fields that do not need the store.
    ///
    /// Parent checks (existence, cycles, batch capacity) need the store and
    /// are done by the engine.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(PRIORITY_USER..=PRIORITY_BACKGROUND).contains(&self.priority) {
            return Err(ValidationError::PriorityOutOfRange(self.priority));
        }
        if !(self.payload.is_object() || self.payload.is_null()) {
            return Err(ValidationError::MalformedPayload(format!(
                "expected an object, got {}",
                json_type_name(&self.payload)
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.max_attempts == 0 || self.max_attempts > MAX_ATTEMPTS_LIMIT {
            return Err(ValidationError::InvalidMaxAttempts(self.max_attempts));
        }
        if self.batch_size == Some(0) {
            return Err(ValidationError::EmptyBatch);
        }
        if self.batch_size.is_some() && self.parent_job_id.is_some() {
            return Err(ValidationError::NestedBatch);
        }
        Ok(())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            id: JobId = "job-test",
        }
        set {
            kind: JobKind = JobKind::Analyze,
            status: JobStatus = JobStatus::Created,
            priority: u8 = PRIORITY_DEFAULT,
            payload: Value = Value::Null,
            progress: u8 = 0,
            attempts: u32 = 0,
            max_attempts: u32 = 3,
            user_initiated: bool = false,
            timeout_secs: u64 = 30,
            seq: u64 = 0,
            created_at_ms: u64 = 1_000_000,
        }
        option {
            status_text: String = None,
            result: Value = None,
            error: String = None,
            parent_job_id: JobId = None,
            batch_size: u32 = None,
            queued_at_ms: u64 = None,
            started_at_ms: u64 = None,
            completed_at_ms: u64 = None,
            timeout_at_ms: u64 = None,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
