// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Batch rollup: deriving a parent's progress and outcome from its children.
//!
//! Everything here is a pure function of the declared batch size and the
//! full child set, so recomputing at any time yields the same answer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::job::{Job, JobStatus};
use crate::transition::{Transition, CANCELLED};

/// Child outcome counts for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub completed: u32,
    pub failed: u32,
    pub timed_out: u32,
    pub cancelled: u32,
    /// Children that exist but are not terminal yet
    pub pending: u32,
    /// Declared batch size
    pub total: u32,
}

/// Final status a finished batch rolls up to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    Completed,
    Failed,
    TimedOut,
    Cancelled,
}

impl BatchSummary {
    pub fn from_children<'a>(total: u32, children: impl IntoIterator<Item = &'a Job>) -> Self {
        let mut summary = BatchSummary { total, ..BatchSummary::default() };
        for child in children {
            match child.status {
                JobStatus::Completed => summary.completed += 1,
                JobStatus::Failed => summary.failed += 1,
                JobStatus::Timeout => summary.timed_out += 1,
                JobStatus::Cancelled => summary.cancelled += 1,
                JobStatus::Created | JobStatus::Queued | JobStatus::Running => {
                    summary.pending += 1
                }
            }
        }
        summary
    }

    /// Children in a terminal status.
    pub fn finished(&self) -> u32 {
        self.completed + self.failed + self.timed_out + self.cancelled
    }

    /// `floor(100 * finished / total)`
    pub fn progress(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let finished = u64::from(self.finished().min(self.total));
        (finished * 100 / u64::from(self.total)) as u8
    }

    /// Every declared child exists and is terminal.
    pub fn is_complete(&self) -> bool {
        self.pending == 0 && self.finished() >= self.total
    }

    /// Worst child outcome, once the batch is complete.
    ///
    /// Severity: failed > timeout > cancelled > completed.
    pub fn outcome(&self) -> Option<BatchOutcome> {
        if !self.is_complete() {
            return None;
        }
        Some(if self.failed > 0 {
            BatchOutcome::Failed
        } else if self.timed_out > 0 {
            BatchOutcome::TimedOut
        } else if self.cancelled > 0 {
            BatchOutcome::Cancelled
        } else {
            BatchOutcome::Completed
        })
    }

    /// Human-readable failure description for the parent's `error`.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.failed > 0 {
            parts.push(format!("{} failed", self.failed));
        }
        if self.timed_out > 0 {
            parts.push(format!("{} timed out", self.timed_out));
        }
        if self.cancelled > 0 {
            parts.push(format!("{} cancelled", self.cancelled));
        }
        format!(
            "{} of {} children did not complete ({})",
            self.total.saturating_sub(self.completed),
            self.total,
            parts.join(", ")
        )
    }

    pub fn to_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Transitions that walk a parent from `status` to the batch outcome.
///
/// Parents never run on an executor, so they pass through `queued` and
/// `running` in the same write as the final transition. Terminal parents
/// get an empty path.
pub fn finalize_path(status: JobStatus, summary: &BatchSummary) -> Vec<Transition> {
    let Some(outcome) = summary.outcome() else {
        return Vec::new();
    };
    let mut path = match status {
        JobStatus::Created => vec![Transition::Enqueue, Transition::Dispatch],
        JobStatus::Queued => vec![Transition::Dispatch],
        JobStatus::Running => Vec::new(),
        _ => return Vec::new(),
    };
    path.push(match outcome {
        BatchOutcome::Completed => Transition::Succeed { result: summary.to_value() },
        BatchOutcome::Failed => Transition::Fail { error: summary.describe() },
        BatchOutcome::TimedOut => Transition::TimeOut { reason: summary.describe() },
        BatchOutcome::Cancelled => Transition::Cancel { reason: CANCELLED.to_string() },
    });
    path
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
