// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `spindle run` and `spindle recover`

use std::sync::Arc;

use anyhow::Result;
use spindle_engine::{
    executors_from_config, format_duration, spawn_timeout_monitor, ProcessTable, RecoveryReport,
    WorkerPool,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{Backend, Session, EXIT_LOCKED};
use crate::control::{socket_path, ControlServer};
use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};

/// Print what recovery did when the store was opened.
///
/// While `spindle run` is active this is the report from its startup.
pub async fn recover(session: &Session, format: OutputFormat) -> Result<()> {
    let report = session.recovery().await?;
    format_or_json(format, &report, || print_recovery(&report))
}

fn print_recovery(report: &RecoveryReport) {
    if report.is_empty() {
        println!("Nothing to recover");
        return;
    }
    println!(
        "Recovered {} interrupted job(s): {} re-queued, {} failed",
        report.interrupted.len(),
        report.requeued.len(),
        report.interrupted.len() - report.requeued.len(),
    );
    for id in &report.interrupted {
        let outcome = if report.requeued.contains(id) { "re-queued" } else { "failed" };
        println!("  {id} {outcome}");
    }
    if !report.batches_finalized.is_empty() {
        println!("Finalized {} batch(es)", report.batches_finalized.len());
    }
}

/// Run the worker pool, Timeout Monitor and control socket until Ctrl-C.
pub async fn run(session: Session, workers: Option<usize>) -> Result<()> {
    let Session { state_dir, mut config, backend } = session;
    let Backend::Local { engine, recovery } = backend else {
        let message = "another `spindle run` holds this state directory";
        return Err(ExitError::new(EXIT_LOCKED, message).into());
    };
    if let Some(workers) = workers {
        config.workers.concurrency = workers;
    }
    config.validate().map_err(|e| ExitError::new(2, e.to_string()))?;

    let processes = ProcessTable::new();
    let executors =
        executors_from_config(&config, &processes).map_err(|e| ExitError::new(2, e.to_string()))?;
    let control = ControlServer::bind(&state_dir).map_err(|e| {
        ExitError::new(1, format!("failed to bind {}: {e}", socket_path(&state_dir).display()))
    })?;
    let engine = Arc::new(engine);
    let shutdown = CancellationToken::new();

    info!(
        state_dir = %state_dir.display(),
        socket = %control.path().display(),
        workers = config.workers.concurrency,
        executors = ?executors.kinds(),
        timeout_check = %format_duration(config.timeout_check_interval),
        interrupted = recovery.interrupted.len(),
        "spindle running"
    );

    let monitor = spawn_timeout_monitor(
        Arc::clone(&engine),
        config.timeout_check_interval,
        shutdown.clone(),
    );
    let control = tokio::spawn(control.run(Arc::clone(&engine), recovery, shutdown.clone()));
    let pool = WorkerPool::new(Arc::clone(&engine), executors, &config.workers);
    let pool = tokio::spawn(pool.run(shutdown.clone()));

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    shutdown.cancel();

    let _ = pool.await;
    let _ = monitor.await;
    let _ = control.await;
    info!(running = processes.len(), "stopped");
    Ok(())
}
