// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable file-backed store.
//!
//! Layout under the store root:
//!
//! ```text
//! store.lock          exclusive lock, holds the owning PID
//! jobs/<id>.json      one versioned record per job
//! jobs/<id>.corrupt   records that failed to parse, set aside on open
//! ```
//!
//! Every write goes to a temp file that is fsynced and renamed over the
//! record, so a crash leaves either the old or the new record on disk.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use parking_lot::RwLock;
use spindle_core::{filter, Job, JobFilter, JobId, JobOrder};
use tracing::{debug, info, warn};

use crate::record;
use crate::store::{JobStore, StoreError};

const LOCK_FILE: &str = "store.lock";
const JOBS_DIR: &str = "jobs";

/// A [`JobStore`] persisting each job as its own JSON file.
///
/// Opening takes an exclusive lock on the store directory; a second process
/// opening the same directory gets [`StoreError::Locked`]. Reads are served
/// from an in-memory index loaded at open and updated after each durable write.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    jobs_dir: PathBuf,
    cache: RwLock<HashMap<JobId, Job>>,
    // Held for the lifetime of the store; the OS releases it on drop/exit.
    _lock: File,
}

impl FileStore {
    /// Open (or create) the store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let jobs_dir = root.join(JOBS_DIR);
        fs::create_dir_all(&jobs_dir)?;

        let lock = acquire_lock(&root)?;
        let cache = load_records(&jobs_dir)?;
        info!(root = %root.display(), jobs = cache.len(), "opened job store");

        Ok(Self { root, jobs_dir, cache: RwLock::new(cache), _lock: lock })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: &JobId) -> Result<PathBuf, StoreError> {
        check_id(id)?;
        Ok(self.jobs_dir.join(format!("{}.json", id.as_str())))
    }
}

impl JobStore for FileStore {
    fn put(&self, job: &Job) -> Result<(), StoreError> {
        let path = self.record_path(&job.id)?;
        let bytes = record::encode(job)?;
        write_atomic(&path, &bytes)?;
        sync_dir(&self.jobs_dir)?;
        self.cache.write().insert(job.id.clone(), job.clone());
        debug!(job_id = %job.id, status = %job.status, "persisted job record");
        Ok(())
    }

    fn get(&self, id: &JobId) -> Result<Job, StoreError> {
        self.cache.read().get(id).cloned().ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn query(&self, filter: &JobFilter, order: JobOrder) -> Result<Vec<Job>, StoreError> {
        Ok(filter::select(self.cache.read().values(), filter, order))
    }

    fn delete(&self, id: &JobId) -> Result<(), StoreError> {
        let path = self.record_path(id)?;
        if !self.cache.read().contains_key(id) {
            return Err(StoreError::NotFound(id.clone()));
        }
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        sync_dir(&self.jobs_dir)?;
        self.cache.write().remove(id);
        debug!(job_id = %id, "deleted job record");
        Ok(())
    }
}

/// Take the exclusive store lock and record our PID in it.
fn acquire_lock(root: &Path) -> Result<File, StoreError> {
    let lock_path = root.join(LOCK_FILE);
    // Don't truncate before holding the lock: that would wipe the owner's PID.
    let lock_file = OpenOptions::new().write(true).create(true).truncate(false).open(&lock_path)?;
    lock_file.try_lock_exclusive().map_err(|_| StoreError::Locked(root.to_path_buf()))?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    Ok(lock_file)
}

fn load_records(jobs_dir: &Path) -> Result<HashMap<JobId, Job>, StoreError> {
    let mut jobs = HashMap::new();
    for entry in fs::read_dir(jobs_dir)? {
        let path = entry?.path();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {}
            Some("tmp") => {
                // Interrupted write; the previous record (if any) is intact.
                debug!(path = %path.display(), "removing stale temp record");
                let _ = fs::remove_file(&path);
                continue;
            }
            _ => continue,
        }

        let bytes = fs::read(&path)?;
        match record::decode(&path, &bytes) {
            Ok(job) => {
                jobs.insert(job.id.clone(), job);
            }
            Err(StoreError::Json(e)) => {
                let quarantine = path.with_extension("corrupt");
                warn!(
                    path = %path.display(),
                    error = %e,
                    "corrupt job record, moving to {}",
                    quarantine.display(),
                );
                fs::rename(&path, &quarantine)?;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(jobs)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Make renames and unlinks in `dir` durable.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<(), StoreError> {
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<(), StoreError> {
    Ok(())
}

/// Ids become file names, so only allow a conservative character set.
fn check_id(id: &JobId) -> Result<(), StoreError> {
    let s = id.as_str();
    let safe = !s.is_empty()
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if safe {
        Ok(())
    } else {
        Err(StoreError::InvalidId(s.to_string()))
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
