// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control socket served by `spindle run`.
//!
//! `spindle run` holds the store lock for its whole life, so every other
//! command reaches the engine through this socket. Each connection is
//! handled in its own task; the engine serializes mutations per job.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use spindle_core::Clock;
use spindle_engine::{Engine, EngineError, RecoveryReport};
use spindle_storage::JobStore;
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::protocol::{Request, Response};
use super::wire::{self, ProtocolError};
use super::socket_path;
use crate::env::ipc_timeout;
use crate::exit_error::ExitError;

pub struct ControlServer {
    listener: UnixListener,
    path: PathBuf,
}

struct ServeCtx<S: JobStore, C: Clock> {
    engine: Arc<Engine<S, C>>,
    recovery: RecoveryReport,
}

impl ControlServer {
    /// Bind `<state_dir>/spindle.sock`.
    ///
    /// The caller holds the store lock, so a socket file already there was
    /// left by a process that is gone.
    pub fn bind(state_dir: &Path) -> std::io::Result<Self> {
        let path = socket_path(state_dir);
        match std::fs::remove_file(&path) {
            Ok(()) => debug!(socket = %path.display(), "removed stale control socket"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        let listener = UnixListener::bind(&path)?;
        Ok(Self { listener, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accept connections until `shutdown` fires, then remove the socket file.
    pub async fn run<S: JobStore, C: Clock>(
        self,
        engine: Arc<Engine<S, C>>,
        recovery: RecoveryReport,
        shutdown: CancellationToken,
    ) {
        let ctx = Arc::new(ServeCtx { engine, recovery });
        debug!(socket = %self.path.display(), "control socket listening");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _)) => {
                        let ctx = Arc::clone(&ctx);
                        tokio::spawn(async move {
                            if let Err(e) = serve(stream, &ctx).await {
                                log_connection_error(e);
                            }
                        });
                    }
                    Err(e) => error!(error = %e, "control socket accept failed"),
                },
            }
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(socket = %self.path.display(), error = %e, "failed to remove control socket");
        }
    }
}

async fn serve<S: JobStore, C: Clock>(
    mut stream: UnixStream,
    ctx: &ServeCtx<S, C>,
) -> Result<(), ProtocolError> {
    let timeout = ipc_timeout();
    let request: Request = wire::read_frame(&mut stream, timeout).await?;
    debug!(?request, "control request");
    let response = handle(ctx.engine.as_ref(), &ctx.recovery, request);
    wire::write_frame(&mut stream, &response, timeout).await
}

fn log_connection_error(e: ProtocolError) {
    match e {
        ProtocolError::ConnectionClosed => debug!("control client disconnected"),
        ProtocolError::Timeout => warn!("control connection timed out"),
        other => error!(error = %other, "control connection failed"),
    }
}

/// Answer one request against `engine`.
///
/// Shared by the socket and by commands that hold the store themselves, so
/// both paths give the same answers and exit codes.
pub fn handle<S: JobStore, C: Clock>(
    engine: &Engine<S, C>,
    recovery: &RecoveryReport,
    request: Request,
) -> Response {
    let result = match request {
        Request::Resolve { prefix } => engine.resolve_id(&prefix).map(|id| Response::Id { id }),
        Request::Create { spec, enqueue } => engine
            .create_job(spec)
            .and_then(|id| if enqueue { engine.enqueue(&id) } else { engine.get_job(&id) })
            .map(job),
        Request::Enqueue { id } => engine.enqueue(&id).map(job),
        Request::Get { id } => engine.get_job(&id).map(job),
        Request::List { filter, order } => {
            engine.list_jobs(&filter, order).map(|jobs| Response::Jobs { jobs })
        }
        Request::Stats => engine.job_stats().map(|stats| Response::Stats { stats }),
        Request::Cancel { id } => engine.cancel(&id).map(job),
        Request::Retry { id } => engine.retry(&id).map(job),
        Request::Cleanup { older_than_ms } => engine
            .cleanup_older_than(Duration::from_millis(older_than_ms))
            .map(|ids| Response::Removed { ids }),
        Request::Batch { id } => batch(engine, &id),
        Request::Recovery => Ok(Response::Recovery { report: recovery.clone() }),
    };
    result.unwrap_or_else(|e| {
        let e = ExitError::from(e);
        Response::Error { code: e.code, message: e.message }
    })
}

fn job(job: spindle_core::Job) -> Response {
    Response::Job { job: Box::new(job) }
}

fn batch<S: JobStore, C: Clock>(
    engine: &Engine<S, C>,
    id: &spindle_core::JobId,
) -> Result<Response, EngineError> {
    let summary = engine.aggregate(id)?;
    let children = engine.children_of(id)?;
    Ok(Response::Batch { summary, children })
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
