// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine fixtures shared by the unit tests.

use std::sync::Arc;

use parking_lot::Mutex;
use spindle_core::{FakeClock, JobId, JobKind, JobSpec, JobStatus, TransitionEvent};
use spindle_storage::MemoryStore;

use crate::config::EngineConfig;
use crate::engine::Engine;

pub(crate) type TestEngine = Engine<Arc<MemoryStore>, FakeClock>;

/// A fresh engine over an empty in-memory store.
pub(crate) fn engine() -> (TestEngine, FakeClock) {
    engine_over(Arc::new(MemoryStore::new()))
}

/// Open an engine over an existing store (simulates a restart).
pub(crate) fn engine_over(store: Arc<MemoryStore>) -> (TestEngine, FakeClock) {
    let clock = FakeClock::new();
    let (engine, _) = Engine::open(store, clock.clone(), EngineConfig::default()).unwrap();
    (engine, clock)
}

pub(crate) fn spec(kind: JobKind) -> JobSpec {
    EngineConfig::default().spec(kind)
}

/// Submit a job and claim it, asserting it was the one dispatched.
pub(crate) fn start(engine: &TestEngine, spec: JobSpec) -> JobId {
    let id = engine.submit(spec).unwrap();
    let claimed = engine.claim_next().unwrap().unwrap();
    assert_eq!(claimed.id, id);
    id
}

/// Records every `(job, from, to)` the engine publishes.
pub(crate) fn record(engine: &TestEngine) -> Arc<Mutex<Vec<(JobId, JobStatus, JobStatus)>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    engine.on_transition(move |e: &TransitionEvent| sink.lock().push((e.job_id.clone(), e.from, e.to)));
    log
}
