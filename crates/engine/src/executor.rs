// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor seam: the external components that do a job's actual work.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use spindle_core::{Failure, Job, JobKind};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::ExecError;

/// A progress report from a running executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub percent: u8,
    pub text: Option<String>,
}

/// Handed to [`Executor::execute`] for one attempt.
#[derive(Debug, Clone)]
pub struct ExecContext {
    cancel: CancellationToken,
    progress: mpsc::UnboundedSender<Progress>,
}

impl ExecContext {
    pub fn new(cancel: CancellationToken, progress: mpsc::UnboundedSender<Progress>) -> Self {
        Self { cancel, progress }
    }

    /// Fires when the job leaves `running` under the executor (cancelled,
    /// timed out) or the worker pool shuts down. Stop promptly.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    pub fn report_progress(&self, percent: u8, text: Option<String>) {
        // Receiver gone means the attempt is over; nothing to report to.
        let _ = self.progress.send(Progress { percent, text });
    }
}

/// Performs the work one job type describes.
#[async_trait]
pub trait Executor: Send + Sync + 'static {
    async fn execute(&self, job: Job, ctx: ExecContext) -> Result<Value, Failure>;
}

/// Executors keyed by the job type they handle.
#[derive(Clone, Default)]
pub struct ExecutorSet {
    executors: HashMap<JobKind, Arc<dyn Executor>>,
}

impl ExecutorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: JobKind, executor: impl Executor) -> Self {
        self.insert(kind, Arc::new(executor));
        self
    }

    pub fn insert(&mut self, kind: JobKind, executor: Arc<dyn Executor>) {
        self.executors.insert(kind, executor);
    }

    pub fn get(&self, kind: JobKind) -> Result<Arc<dyn Executor>, ExecError> {
        self.executors.get(&kind).cloned().ok_or(ExecError::NoExecutor(kind))
    }

    /// Kinds with an executor, in declaration order.
    pub fn kinds(&self) -> Vec<JobKind> {
        JobKind::ALL.into_iter().filter(|kind| self.executors.contains_key(kind)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}

impl std::fmt::Debug for ExecutorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorSet").field("kinds", &self.kinds()).finish()
    }
}
