// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The store contract shared by every backend.

use std::path::PathBuf;
use std::sync::Arc;

use spindle_core::{Job, JobFilter, JobId, JobOrder};
use thiserror::Error;

/// Errors that can occur in store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("invalid job id for storage: {0:?}")]
    InvalidId(String),
    #[error("store at {0} is locked by another process")]
    Locked(PathBuf),
    #[error("record {path} has version {found}, newest supported is {supported}")]
    TooNew { path: PathBuf, found: u32, supported: u32 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Keyed job storage.
///
/// Writes replace a whole record at once: readers observe either the old or
/// the new job, never a mix. A successful `put`/`delete` is durable before it
/// returns. The store does not serialize read-modify-write cycles; callers
/// that transition a job hold the engine's per-job lock around get + put.
pub trait JobStore: Send + Sync + 'static {
    fn put(&self, job: &Job) -> Result<(), StoreError>;

    fn get(&self, id: &JobId) -> Result<Job, StoreError>;

    fn query(&self, filter: &JobFilter, order: JobOrder) -> Result<Vec<Job>, StoreError>;

    fn delete(&self, id: &JobId) -> Result<(), StoreError>;

    fn contains(&self, id: &JobId) -> Result<bool, StoreError> {
        match self.get(id) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl<S: JobStore + ?Sized> JobStore for Arc<S> {
    fn put(&self, job: &Job) -> Result<(), StoreError> {
        (**self).put(job)
    }

    fn get(&self, id: &JobId) -> Result<Job, StoreError> {
        (**self).get(id)
    }

    fn query(&self, filter: &JobFilter, order: JobOrder) -> Result<Vec<Job>, StoreError> {
        (**self).query(filter, order)
    }

    fn delete(&self, id: &JobId) -> Result<(), StoreError> {
        (**self).delete(id)
    }
}
