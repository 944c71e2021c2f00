// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job lock table.
//!
//! Every read-modify-write of a job record happens under that job's lock, so
//! transitions are serialized per job while different jobs proceed in
//! parallel. Entries are dropped once no guard or waiter refers to them.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{ArcMutexGuard, Mutex, RawMutex};
use spindle_core::JobId;

#[derive(Debug, Default)]
pub(crate) struct JobLocks {
    table: Mutex<HashMap<JobId, Arc<Mutex<()>>>>,
}

/// Holds one job's lock until dropped.
pub(crate) struct JobGuard<'a> {
    locks: &'a JobLocks,
    id: JobId,
    guard: Option<ArcMutexGuard<RawMutex, ()>>,
}

impl JobLocks {
    pub(crate) fn lock(&self, id: &JobId) -> JobGuard<'_> {
        let slot = Arc::clone(self.table.lock().entry(id.clone()).or_default());
        let guard = slot.lock_arc();
        JobGuard { locks: self, id: id.clone(), guard: Some(guard) }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.table.lock().len()
    }
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut table = self.locks.table.lock();
        // Only the table's own reference left: nobody holds or waits on it.
        if table.get(&self.id).is_some_and(|slot| Arc::strong_count(slot) == 1) {
            table.remove(&self.id);
        }
    }
}

#[cfg(test)]
#[path = "locks_tests.rs"]
mod tests;
