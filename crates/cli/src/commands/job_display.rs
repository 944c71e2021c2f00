// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Display helpers for job commands.

use std::io::Write;

use spindle_core::{BatchSummary, Job, JobStats, JobStatus};

use crate::color;
use crate::output::{format_age, format_timestamp, Table};

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

pub(crate) fn format_job_list(out: &mut (impl Write + ?Sized), jobs: &[Job], now_ms: u64) {
    // ATTEMPTS only matters once something has failed
    let show_attempts = jobs.iter().any(|job| job.attempts > 0);

    let mut headers = vec!["ID", "KIND", "PRI", "PROGRESS", "AGE"];
    if show_attempts {
        headers.push("ATTEMPTS");
    }
    headers.push("STATUS");
    let mut table = Table::new(headers);

    for job in jobs {
        let mut cells = vec![
            job.id.short(8).to_string(),
            job.kind.to_string(),
            job.priority.to_string(),
            format!("{}%", job.progress),
            format_age(now_ms, job.created_at_ms),
        ];
        if show_attempts {
            cells.push(format!("{}/{}", job.attempts, job.max_attempts));
        }
        cells.push(color::status(&job.status.to_string()));
        table.row(cells);
    }
    table.render(out);
}

pub(crate) fn print_job(job: &Job, batch: Option<(&BatchSummary, &[Job])>) {
    println!("{} {}", color::header("Job:"), job.id);
    println!("  {} {}", color::context("Kind:"), job.kind);
    println!("  {} {}", color::context("Status:"), color::status(&job.status.to_string()));
    println!("  {} {}", color::context("Priority:"), job.priority);
    match &job.status_text {
        Some(text) => println!("  {} {}% ({})", color::context("Progress:"), job.progress, text),
        None => println!("  {} {}%", color::context("Progress:"), job.progress),
    }
    println!("  {} {}/{}", color::context("Attempts:"), job.attempts, job.max_attempts);
    println!("  {} {}s", color::context("Timeout:"), job.timeout_secs);
    if job.user_initiated {
        println!("  {} yes", color::context("User:"));
    }
    if let Some(parent) = &job.parent_job_id {
        println!("  {} {}", color::context("Parent:"), parent);
    }

    println!("  {} {}", color::context("Created:"), format_timestamp(job.created_at_ms));
    for (label, at) in [
        ("Queued:", job.queued_at_ms),
        ("Started:", job.started_at_ms),
        ("Finished:", job.completed_at_ms),
    ] {
        if let Some(at) = at {
            println!("  {} {}", color::context(label), format_timestamp(at));
        }
    }
    if let (JobStatus::Running, Some(deadline)) = (job.status, job.timeout_at_ms) {
        println!("  {} {}", color::context("Deadline:"), format_timestamp(deadline));
    }

    if !job.payload.is_null() {
        println!("  {} {}", color::context("Payload:"), truncate(&job.payload.to_string(), 100));
    }
    if let Some(result) = &job.result {
        println!("  {} {}", color::context("Result:"), truncate(&result.to_string(), 100));
    }
    if let Some(error) = &job.error {
        println!();
        println!("  {} {}", color::context("Error:"), error);
    }

    if let Some((summary, children)) = batch {
        println!();
        println!(
            "  {} {}/{} finished ({} completed, {} failed, {} timed out, {} cancelled)",
            color::header("Batch:"),
            summary.finished(),
            summary.total,
            summary.completed,
            summary.failed,
            summary.timed_out,
            summary.cancelled,
        );
        for child in children {
            println!(
                "    {} {}",
                color::muted(child.id.short(8)),
                color::status(&child.status.to_string())
            );
        }
    }
}

pub(crate) fn print_stats(stats: &JobStats) {
    for status in JobStatus::ALL {
        println!("{:<10} {}", status.to_string(), stats.count(status));
    }
    println!("{:<10} {}", "total", stats.total());
}

#[cfg(test)]
#[path = "job_display_tests.rs"]
mod tests;
