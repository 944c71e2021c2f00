// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job commands: submit, enqueue, list, show, stats, cancel, retry, cleanup

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use serde_json::Value;
use spindle_core::{Clock, JobFilter, JobKind, JobOrder, JobStatus, SystemClock, PRIORITY_USER};
use spindle_engine::{format_duration, parse_duration};

use super::job_display::{format_job_list, print_job, print_stats};
use super::Session;
use crate::exit_error::{ExitError, EXIT_REJECTED};
use crate::output::{format_or_json, handle_list, OutputFormat};

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Job type (scan, analyze, batch-analyze, export, stem-separation, tag-write, cleanup)
    #[arg(value_parser = parse_kind)]
    pub kind: JobKind,

    /// Scheduling priority, 1 (first) to 10 (background)
    #[arg(short, long)]
    pub priority: Option<u8>,

    /// Executor parameters as a JSON object
    #[arg(long)]
    pub payload: Option<String>,

    /// Per-attempt timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Attempts before the job stays failed
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Batch parent this job belongs to (id or prefix)
    #[arg(long)]
    pub parent: Option<String>,

    /// Create a batch parent expecting this many children
    #[arg(long, conflicts_with = "parent")]
    pub batch_size: Option<u32>,

    /// Mark as user-initiated (defaults priority to 1)
    #[arg(long)]
    pub user: bool,

    /// Leave the job in `created` instead of queueing it
    #[arg(long)]
    pub no_enqueue: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by status (repeatable)
    #[arg(long, value_parser = parse_status)]
    pub status: Vec<JobStatus>,

    /// Filter by job type (repeatable)
    #[arg(long, value_parser = parse_kind)]
    pub kind: Vec<JobKind>,

    /// Only children of this batch (id or prefix)
    #[arg(long)]
    pub parent: Option<String>,

    /// Only user-initiated jobs
    #[arg(long)]
    pub user: bool,

    /// Maximum number of jobs to show
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
}

pub(crate) fn parse_kind(s: &str) -> Result<JobKind, String> {
    s.parse().map_err(|e: spindle_core::ValidationError| e.to_string())
}

pub(crate) fn parse_status(s: &str) -> Result<JobStatus, String> {
    s.parse().map_err(|e: spindle_core::ValidationError| e.to_string())
}

/// `--older-than` accepts `30s`, `15m`, `12h`, `7d`.
pub(crate) fn parse_age(s: &str) -> Result<Duration, String> {
    let age = parse_duration(s)?;
    if age.is_zero() {
        return Err("age must be greater than zero".to_string());
    }
    Ok(age)
}

pub(crate) fn parse_payload(raw: Option<&str>) -> Result<Value, ExitError> {
    match raw {
        None => Ok(Value::Null),
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| ExitError::new(EXIT_REJECTED, format!("malformed payload: {e}"))),
    }
}

pub async fn submit(session: &Session, args: SubmitArgs, format: OutputFormat) -> Result<()> {
    let mut spec = session.spec(args.kind).payload(parse_payload(args.payload.as_deref())?);
    if args.user {
        spec = spec.user_initiated(true).priority(PRIORITY_USER);
    }
    if let Some(priority) = args.priority {
        spec = spec.priority(priority);
    }
    if let Some(timeout) = args.timeout {
        spec = spec.timeout_secs(timeout);
    }
    if let Some(max_attempts) = args.max_attempts {
        spec = spec.max_attempts(max_attempts);
    }
    if let Some(parent) = &args.parent {
        spec = spec.parent_job_id(session.resolve(parent).await?);
    }
    if let Some(size) = args.batch_size {
        spec = spec.batch_size(size);
    }

    let job = session.create(spec, !args.no_enqueue).await?;
    format_or_json(format, &job, || {
        println!(
            "Submitted job {} ({}, priority {}, {})",
            job.id, job.kind, job.priority, job.status
        );
    })
}

pub async fn enqueue(session: &Session, id: &str, format: OutputFormat) -> Result<()> {
    let id = session.resolve(id).await?;
    let job = session.enqueue(&id).await?;
    format_or_json(format, &job, || println!("Queued job {}", job.id))
}

pub async fn list(session: &Session, args: ListArgs, format: OutputFormat) -> Result<()> {
    let parent_job_id = match args.parent.as_deref() {
        Some(parent) => Some(session.resolve(parent).await?),
        None => None,
    };
    let filter = JobFilter {
        statuses: args.status,
        kinds: args.kind,
        parent_job_id,
        user_initiated: args.user.then_some(true),
        ..JobFilter::default()
    }
    .with_limit(args.limit);
    let jobs = session.list(filter, JobOrder::CreatedDesc).await?;
    let now = SystemClock.epoch_ms();
    handle_list(format, &jobs, "No jobs", |items, out| format_job_list(out, items, now))
}

pub async fn show(session: &Session, id: &str, format: OutputFormat) -> Result<()> {
    let job = session.get(&session.resolve(id).await?).await?;

    if !job.is_batch() {
        return format_or_json(format, &job, || print_job(&job, None));
    }
    let (summary, children) = session.batch(&job.id).await?;
    let data = serde_json::json!({ "job": job, "batch": summary, "children": children });
    format_or_json(format, &data, || print_job(&job, Some((&summary, &children))))
}

pub async fn stats(session: &Session, format: OutputFormat) -> Result<()> {
    let stats = session.stats().await?;
    format_or_json(format, &stats, || print_stats(&stats))
}

/// Cancel each id independently; the worst failure decides the exit code.
pub async fn cancel(session: &Session, ids: &[String], format: OutputFormat) -> Result<()> {
    let mut cancelled = Vec::new();
    let mut rejected = Vec::new();
    let mut code = 0;

    for raw in ids {
        let outcome = match session.resolve(raw).await {
            Ok(id) => session.cancel(&id).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(job) => cancelled.push(job),
            Err(e) => {
                code = code.max(e.code);
                rejected.push(serde_json::json!({ "id": raw, "error": e.message }));
            }
        }
    }

    let data = serde_json::json!({ "cancelled": cancelled, "rejected": rejected });
    format_or_json(format, &data, || {
        for job in &cancelled {
            println!("Cancelled job {}", job.id);
        }
        for entry in &rejected {
            let id = entry["id"].as_str().unwrap_or_default();
            eprintln!("{id}: {}", entry["error"].as_str().unwrap_or_default());
        }
    })?;

    if code != 0 {
        let message = format!("{} of {} job(s) not cancelled", rejected.len(), ids.len());
        return Err(ExitError::new(code, message).into());
    }
    Ok(())
}

pub async fn retry(session: &Session, id: &str, format: OutputFormat) -> Result<()> {
    let id = session.resolve(id).await?;
    let job = session.retry(&id).await?;
    format_or_json(format, &job, || {
        println!("Re-queued job {} (attempt {} of {})", job.id, job.attempt(), job.max_attempts)
    })
}

pub async fn cleanup(session: &Session, older_than: Duration, format: OutputFormat) -> Result<()> {
    let removed = session.cleanup(older_than).await?;
    let data = serde_json::json!({ "older_than": format_duration(older_than), "removed": removed });
    format_or_json(format, &data, || {
        for id in &removed {
            println!("Removed job {id}");
        }
        println!("{} job(s) older than {} removed", removed.len(), format_duration(older_than));
    })
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
