// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Requests a CLI command sends to `spindle run`, and the answers.

use serde::{Deserialize, Serialize};
use spindle_core::{BatchSummary, Job, JobFilter, JobId, JobOrder, JobSpec, JobStats};
use spindle_engine::RecoveryReport;

/// CLI to `spindle run`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Full id for an id or unique prefix
    Resolve { prefix: String },
    /// Create a job (a batch parent when `spec.batch_size` is set)
    Create { spec: JobSpec, enqueue: bool },
    Enqueue { id: JobId },
    Get { id: JobId },
    List { filter: JobFilter, order: JobOrder },
    Stats,
    Cancel { id: JobId },
    Retry { id: JobId },
    Cleanup { older_than_ms: u64 },
    /// Outcome counts and children of a batch parent
    Batch { id: JobId },
    /// What recovery did when the store was opened
    Recovery,
}

/// `spindle run` to CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Id { id: JobId },
    Job { job: Box<Job> },
    Jobs { jobs: Vec<Job> },
    Stats { stats: JobStats },
    Batch { summary: BatchSummary, children: Vec<Job> },
    Removed { ids: Vec<JobId> },
    Recovery { report: RecoveryReport },
    /// The request was refused; `code` is the exit code the CLI returns
    Error { code: i32, message: String },
}
