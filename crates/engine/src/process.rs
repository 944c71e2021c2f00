// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External worker processes.
//!
//! [`ProcessTable`] is the ownership map from job to OS process, held by the
//! executor that spawned the process (never by the scheduler).
//! [`SubprocessExecutor`] runs a worker program and speaks its line protocol:
//!
//! ```text
//! stdout  PROGRESS:<0-100>
//! stdout  RESULT:<json>
//! either  ERROR: <message>
//! exit    non-zero = failure
//! ```

use std::collections::HashMap;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use serde_json::Value;
use spindle_core::transition::CANCELLED;
use spindle_core::{Failure, Job, JobId, JobKind};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::config::{EngineConfig, ExecutorConfig};
use crate::error::ExecError;
use crate::executor::{ExecContext, Executor, ExecutorSet};

/// Stderr lines kept for the failure message when no `ERROR:` line appears.
const STDERR_TAIL_LINES: usize = 5;

/// How [`ProcessTable::terminate`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// No process registered for the job
    NotFound,
    /// Exited within the grace period after SIGTERM
    Exited,
    /// Still alive after the grace period; sent SIGKILL
    Killed,
}

#[derive(Debug, Clone)]
struct Entry {
    pid: u32,
    exited: CancellationToken,
}

/// Job id -> spawned worker process.
#[derive(Debug, Clone, Default)]
pub struct ProcessTable {
    entries: Arc<Mutex<HashMap<JobId, Entry>>>,
}

/// Registration of one process; removes it from the table on drop.
#[derive(Debug)]
pub struct ProcessGuard {
    table: ProcessTable,
    id: JobId,
    pid: u32,
    exited: CancellationToken,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: JobId, pid: u32) -> ProcessGuard {
        let exited = CancellationToken::new();
        self.entries.lock().insert(id.clone(), Entry { pid, exited: exited.clone() });
        ProcessGuard { table: self.clone(), id, pid, exited }
    }

    pub fn pid(&self, id: &JobId) -> Option<u32> {
        self.entries.lock().get(id).map(|entry| entry.pid)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Graceful stop with escalation: SIGTERM, wait up to `grace`, SIGKILL.
    pub async fn terminate(&self, id: &JobId, grace: Duration) -> Termination {
        let Some(entry) = self.entries.lock().get(id).cloned() else {
            return Termination::NotFound;
        };
        if entry.exited.is_cancelled() {
            return Termination::Exited;
        }

        send_signal(id, entry.pid, Signal::SIGTERM);
        if tokio::time::timeout(grace, entry.exited.cancelled()).await.is_ok() {
            return Termination::Exited;
        }
        tracing::warn!(job_id = %id, pid = entry.pid, grace_ms = grace.as_millis() as u64, "worker ignored SIGTERM, killing");
        send_signal(id, entry.pid, Signal::SIGKILL);
        Termination::Killed
    }
}

impl ProcessGuard {
    /// Call once the process has been reaped so its pid is never signalled again.
    pub fn mark_exited(&self) {
        self.exited.cancel();
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        self.exited.cancel();
        let mut entries = self.table.entries.lock();
        if entries.get(&self.id).is_some_and(|entry| entry.pid == self.pid) {
            entries.remove(&self.id);
        }
    }
}

fn send_signal(id: &JobId, pid: u32, signal: Signal) {
    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    match kill(Pid::from_raw(raw), signal) {
        Ok(()) => tracing::debug!(job_id = %id, pid, %signal, "sent signal"),
        Err(nix::errno::Errno::ESRCH) => {}
        Err(e) => tracing::warn!(job_id = %id, pid, %signal, error = %e, "failed to signal worker"),
    }
}

/// Runs a configured worker program for each job.
#[derive(Debug, Clone)]
pub struct SubprocessExecutor {
    config: ExecutorConfig,
    processes: ProcessTable,
    grace: Duration,
}

impl SubprocessExecutor {
    pub fn new(config: ExecutorConfig, processes: ProcessTable, grace: Duration) -> Self {
        Self { config, processes, grace }
    }

    fn command(&self, job: &Job, parameters: &str) -> Command {
        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args)
            .arg("--job-id")
            .arg(job.id.as_str())
            .arg("--parameters")
            .arg(parameters)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &self.config.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }
}

#[async_trait]
impl Executor for SubprocessExecutor {
    async fn execute(&self, job: Job, ctx: ExecContext) -> Result<Value, Failure> {
        let parameters = serde_json::to_string(&job.payload)
            .map_err(|e| Failure::fatal(format!("failed to encode parameters: {e}")))?;
        let mut child = self
            .command(&job, &parameters)
            .spawn()
            .map_err(|e| Failure::fatal(format!("failed to start {}: {e}", self.config.command)))?;
        let Some(pid) = child.id() else {
            return Err(Failure::retryable("worker exited before it could be tracked"));
        };
        let guard = self.processes.register(job.id.clone(), pid);
        tracing::info!(job_id = %job.id, pid, command = %self.config.command, "started worker");

        let stdout = tokio::spawn(read_stdout(child.stdout.take(), ctx.clone()));
        let stderr = tokio::spawn(read_stderr(child.stderr.take()));

        let status = {
            let wait = async {
                let status = child.wait().await;
                guard.mark_exited();
                status
            };
            tokio::pin!(wait);
            tokio::select! {
                status = &mut wait => status,
                _ = ctx.cancelled() => {
                    let (outcome, _) =
                        tokio::join!(self.processes.terminate(&job.id, self.grace), &mut wait);
                    tracing::info!(job_id = %job.id, pid, ?outcome, "worker stopped");
                    return Err(Failure::retryable(CANCELLED));
                }
            }
        };
        let status =
            status.map_err(|e| Failure::retryable(format!("failed to wait for worker: {e}")))?;

        let stdout = stdout.await.unwrap_or_default();
        let stderr = stderr.await.unwrap_or_default();
        interpret(status, stdout, stderr)
    }
}

/// What the worker said on stdout.
#[derive(Debug, Default)]
struct StdoutSummary {
    result: Option<Result<Value, String>>,
    error: Option<String>,
}

/// What the worker said on stderr.
#[derive(Debug, Default)]
struct StderrSummary {
    error: Option<String>,
    tail: Vec<String>,
}

async fn read_stdout(
    stdout: Option<impl AsyncRead + Unpin>,
    ctx: ExecContext,
) -> StdoutSummary {
    let mut summary = StdoutSummary::default();
    let Some(stdout) = stdout else {
        return summary;
    };
    let mut lines = BufReader::new(stdout).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match parse_line(&line) {
            Line::Progress(percent) => ctx.report_progress(percent, None),
            Line::Result(result) => summary.result = Some(result),
            Line::Error(message) => summary.error = Some(message),
            Line::Other => tracing::trace!(line = %line, "worker stdout"),
        }
    }
    summary
}

async fn read_stderr(stderr: Option<impl AsyncRead + Unpin>) -> StderrSummary {
    let mut summary = StderrSummary::default();
    let Some(stderr) = stderr else {
        return summary;
    };
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if let Line::Error(message) = parse_line(&line) {
            summary.error = Some(message);
        } else if !line.trim().is_empty() {
            tracing::debug!(line = %line, "worker stderr");
            if summary.tail.len() == STDERR_TAIL_LINES {
                summary.tail.remove(0);
            }
            summary.tail.push(line);
        }
    }
    summary
}

#[derive(Debug, PartialEq)]
enum Line {
    Progress(u8),
    Result(Result<Value, String>),
    Error(String),
    Other,
}

fn parse_line(line: &str) -> Line {
    let line = line.trim_end();
    if let Some(rest) = line.strip_prefix("PROGRESS:") {
        return match rest.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Line::Progress(value.clamp(0.0, 100.0) as u8),
            _ => Line::Other,
        };
    }
    if let Some(rest) = line.strip_prefix("RESULT:") {
        return Line::Result(serde_json::from_str(rest.trim()).map_err(|e| e.to_string()));
    }
    if let Some(rest) = line.strip_prefix("ERROR:") {
        return Line::Error(rest.trim().to_string());
    }
    Line::Other
}

fn interpret(
    status: ExitStatus,
    stdout: StdoutSummary,
    stderr: StderrSummary,
) -> Result<Value, Failure> {
    let reported = stderr.error.or(stdout.error);
    if !status.success() {
        let message = reported
            .or_else(|| (!stderr.tail.is_empty()).then(|| stderr.tail.join("\n")))
            .unwrap_or_else(|| format!("worker exited with {status}"));
        return Err(Failure::retryable(message));
    }
    if let Some(message) = reported {
        return Err(Failure::retryable(message));
    }
    match stdout.result {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(Failure::fatal(format!("malformed RESULT line: {e}"))),
        None => Ok(Value::Null),
    }
}

/// Build subprocess executors for every `[executors.<kind>]` entry.
pub fn executors_from_config(
    config: &EngineConfig,
    processes: &ProcessTable,
) -> Result<ExecutorSet, ExecError> {
    let mut set = ExecutorSet::new();
    for (name, exec) in &config.executors {
        let kind: JobKind = name.parse().map_err(|e: spindle_core::ValidationError| {
            ExecError::InvalidConfig { kind: name.clone(), reason: e.to_string() }
        })?;
        if exec.command.trim().is_empty() {
            return Err(ExecError::InvalidConfig {
                kind: name.clone(),
                reason: "command is empty".to_string(),
            });
        }
        let executor =
            SubprocessExecutor::new(exec.clone(), processes.clone(), config.cancel_grace_period);
        set.insert(kind, Arc::new(executor));
    }
    Ok(set)
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
