// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query filters and orderings over job records.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::job::{Job, JobId, JobKind, JobStatus};

/// Conjunction of optional predicates; the default matches every job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobFilter {
    /// Empty = any status
    pub statuses: Vec<JobStatus>,
    /// Empty = any kind
    pub kinds: Vec<JobKind>,
    pub parent_job_id: Option<JobId>,
    pub user_initiated: Option<bool>,
    /// Inclusive lower bound on `created_at_ms`
    pub created_after_ms: Option<u64>,
    /// Exclusive upper bound on `created_at_ms`
    pub created_before_ms: Option<u64>,
    /// Exclude batch parents (the scheduler never dispatches them)
    pub exclude_batches: bool,
    pub limit: Option<usize>,
}

impl JobFilter {
    pub fn status(status: JobStatus) -> Self {
        Self { statuses: vec![status], ..Self::default() }
    }

    pub fn children_of(parent: &JobId) -> Self {
        Self { parent_job_id: Some(parent.clone()), ..Self::default() }
    }

    pub fn with_kinds(mut self, kinds: &[JobKind]) -> Self {
        self.kinds = kinds.to_vec();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, job: &Job) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&job.status) {
            return false;
        }
        if !self.kinds.is_empty() && !self.kinds.contains(&job.kind) {
            return false;
        }
        if let Some(parent) = &self.parent_job_id {
            if job.parent_job_id.as_ref() != Some(parent) {
                return false;
            }
        }
        if self.user_initiated.is_some_and(|flag| flag != job.user_initiated) {
            return false;
        }
        if self.created_after_ms.is_some_and(|after| job.created_at_ms < after) {
            return false;
        }
        if self.created_before_ms.is_some_and(|before| job.created_at_ms >= before) {
            return false;
        }
        if self.exclude_batches && job.is_batch() {
            return false;
        }
        true
    }
}

/// Result ordering for queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOrder {
    /// `(priority asc, created_at asc, seq asc)`: the canonical dispatch order
    #[default]
    Scheduling,
    /// Oldest first
    CreatedAsc,
    /// Newest first
    CreatedDesc,
}

impl JobOrder {
    pub fn compare(self, a: &Job, b: &Job) -> Ordering {
        match self {
            JobOrder::Scheduling => (a.priority, a.created_at_ms, a.seq)
                .cmp(&(b.priority, b.created_at_ms, b.seq)),
            JobOrder::CreatedAsc => (a.created_at_ms, a.seq).cmp(&(b.created_at_ms, b.seq)),
            JobOrder::CreatedDesc => (b.created_at_ms, b.seq).cmp(&(a.created_at_ms, a.seq)),
        }
    }

    pub fn sort(self, jobs: &mut [Job]) {
        jobs.sort_by(|a, b| self.compare(a, b));
    }
}

/// Filter, order and truncate an iterator of jobs.
pub fn select<'a>(
    jobs: impl IntoIterator<Item = &'a Job>,
    filter: &JobFilter,
    order: JobOrder,
) -> Vec<Job> {
    let mut selected: Vec<Job> = jobs.into_iter().filter(|job| filter.matches(job)).cloned().collect();
    order.sort(&mut selected);
    if let Some(limit) = filter.limit {
        selected.truncate(limit);
    }
    selected
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
