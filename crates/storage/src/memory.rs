// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory store for tests and throwaway sessions.

use std::collections::HashMap;

use parking_lot::RwLock;
use spindle_core::{filter, Job, JobFilter, JobId, JobOrder};

use crate::store::{JobStore, StoreError};

/// Non-durable [`JobStore`]; state is lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing records (e.g. to simulate a restart).
    pub fn with_jobs(jobs: impl IntoIterator<Item = Job>) -> Self {
        let jobs = jobs.into_iter().map(|job| (job.id.clone(), job)).collect();
        Self { jobs: RwLock::new(jobs) }
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }
}

impl JobStore for MemoryStore {
    fn put(&self, job: &Job) -> Result<(), StoreError> {
        self.jobs.write().insert(job.id.clone(), job.clone());
        Ok(())
    }

    fn get(&self, id: &JobId) -> Result<Job, StoreError> {
        self.jobs.read().get(id).cloned().ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn query(&self, filter: &JobFilter, order: JobOrder) -> Result<Vec<Job>, StoreError> {
        Ok(filter::select(self.jobs.read().values(), filter, order))
    }

    fn delete(&self, id: &JobId) -> Result<(), StoreError> {
        self.jobs.write().remove(id).map(|_| ()).ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
