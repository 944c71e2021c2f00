// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Batch Coordinator: parent/child links and rollup.

use std::collections::HashSet;

use spindle_core::transition::{advance, plan_batch_progress};
use spindle_core::{
    finalize_path, BatchSummary, Clock, Job, JobFilter, JobId, JobOrder, ValidationError,
};
use spindle_storage::{JobStore, StoreError};

use crate::engine::Engine;
use crate::error::EngineError;

impl<S: JobStore, C: Clock> Engine<S, C> {
    pub fn children_of(&self, parent: &JobId) -> Result<Vec<Job>, EngineError> {
        Ok(self.store.query(&JobFilter::children_of(parent), JobOrder::CreatedAsc)?)
    }

    /// Child outcome counts for a batch parent. Pure read; repeated calls
    /// without an intervening child change return the same summary.
    pub fn aggregate(&self, parent: &JobId) -> Result<BatchSummary, EngineError> {
        let job = self.store.get(parent)?;
        let size = job.batch_size.ok_or_else(|| ValidationError::NotABatch(parent.clone()))?;
        Ok(BatchSummary::from_children(size, &self.children_of(parent)?))
    }

    /// Recompute a parent's progress and, once every child is terminal, its
    /// outcome. Idempotent; terminal parents are left alone.
    pub fn refresh_batch(&self, parent: &JobId) -> Result<Job, EngineError> {
        let (job, _) = self.with_job(parent, |job, now| {
            let size = job.batch_size.ok_or_else(|| ValidationError::NotABatch(job.id.clone()))?;
            if job.is_terminal() {
                return Ok(Vec::new());
            }
            let summary = BatchSummary::from_children(size, &self.children_of(&job.id)?);
            if let Some(patch) = plan_batch_progress(job, summary.progress()) {
                patch.apply(job);
            }
            let mut events = Vec::new();
            for transition in finalize_path(job.status, &summary) {
                events.push(advance(job, transition, now)?);
            }
            if !events.is_empty() {
                tracing::info!(
                    job_id = %job.id,
                    status = %job.status,
                    completed = summary.completed,
                    failed = summary.failed,
                    timed_out = summary.timed_out,
                    cancelled = summary.cancelled,
                    "batch finished"
                );
            }
            Ok(events)
        })?;
        Ok(job)
    }

    /// Checks a new child against its parent. Caller holds the parent lock.
    pub(crate) fn check_parent(&self, id: &JobId, parent_id: &JobId) -> Result<(), EngineError> {
        if parent_id == id {
            return Err(ValidationError::ParentCycle(parent_id.clone()).into());
        }
        let parent = match self.store.get(parent_id) {
            Ok(parent) => parent,
            Err(StoreError::NotFound(_)) => {
                return Err(ValidationError::UnknownParent(parent_id.clone()).into())
            }
            Err(e) => return Err(e.into()),
        };

        // Walk up the chain: the new id must not be an ancestor of itself.
        let mut seen = HashSet::from([parent.id.clone()]);
        let mut cursor = parent.parent_job_id.clone();
        while let Some(next) = cursor {
            if next == *id || !seen.insert(next.clone()) {
                return Err(ValidationError::ParentCycle(parent_id.clone()).into());
            }
            cursor = match self.store.get(&next) {
                Ok(ancestor) => ancestor.parent_job_id,
                Err(StoreError::NotFound(_)) => None,
                Err(e) => return Err(e.into()),
            };
        }

        let Some(size) = parent.batch_size else {
            return Err(ValidationError::NotABatch(parent_id.clone()).into());
        };
        if parent.parent_job_id.is_some() {
            return Err(ValidationError::NestedBatch.into());
        }
        if parent.is_terminal() {
            return Err(ValidationError::ParentTerminal(parent_id.clone(), parent.status).into());
        }
        if self.children_of(parent_id)?.len() >= size as usize {
            return Err(ValidationError::BatchFull { parent: parent_id.clone(), size }.into());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
