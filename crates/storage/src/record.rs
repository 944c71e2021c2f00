// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk record envelope.
//!
//! Each job is stored as `{"v": <version>, "job": {...}}` so the schema can
//! evolve without guessing at old files.

use std::path::Path;

use serde::{Deserialize, Serialize};
use spindle_core::Job;

use crate::store::StoreError;

/// Current record schema version
pub const CURRENT_RECORD_VERSION: u32 = 1;

/// A versioned job record as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredJob {
    /// Schema version for migrations
    #[serde(rename = "v")]
    pub version: u32,
    pub job: Job,
}

pub(crate) fn encode(job: &Job) -> Result<Vec<u8>, StoreError> {
    let record = StoredJob { version: CURRENT_RECORD_VERSION, job: job.clone() };
    let mut bytes = serde_json::to_vec_pretty(&record)?;
    bytes.push(b'\n');
    Ok(bytes)
}

pub(crate) fn decode(path: &Path, bytes: &[u8]) -> Result<Job, StoreError> {
    let record: StoredJob = serde_json::from_slice(bytes)?;
    if record.version > CURRENT_RECORD_VERSION {
        return Err(StoreError::TooNew {
            path: path.to_path_buf(),
            found: record.version,
            supported: CURRENT_RECORD_VERSION,
        });
    }
    Ok(record.job)
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
