// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! spindle-engine: job orchestration over a durable store.
//!
//! [`Engine`] is the caller-facing surface (create, enqueue, claim, report,
//! cancel, retry, query, cleanup). [`spawn_timeout_monitor`] and
//! [`WorkerPool`] are the long-running loops built on top of it.

mod batch;
mod config;
pub mod duration;
mod emitter;
mod engine;
mod error;
mod executor;
mod locks;
mod monitor;
mod process;
mod recovery;
mod retry;
mod scheduler;
mod worker;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, EngineConfig, ExecutorConfig, WorkerConfig};
pub use emitter::{EventEmitter, ListenerId};
pub use engine::Engine;
pub use duration::{format_duration, parse_duration};
pub use error::{EngineError, ExecError};
pub use executor::{ExecContext, Executor, ExecutorSet, Progress};
pub use monitor::spawn_timeout_monitor;
pub use process::{executors_from_config, ProcessGuard, ProcessTable, SubprocessExecutor, Termination};
pub use recovery::RecoveryReport;
pub use worker::{PauseHandle, WorkerPool};
