// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod job;
pub(crate) mod job_display;
pub mod run;

use std::path::{Path, PathBuf};
use std::time::Duration;

use spindle_core::{BatchSummary, Job, JobFilter, JobId, JobKind, JobOrder, JobSpec, JobStats, SystemClock};
use spindle_engine::{Engine, EngineConfig, RecoveryReport};
use spindle_storage::{FileStore, StoreError};
use tracing::debug;

use crate::control::{self, ClientError, ControlClient, Request, Response};
use crate::env;
use crate::exit_error::ExitError;

pub type CliEngine = Engine<FileStore, SystemClock>;

/// Exit code when another process holds the store.
pub const EXIT_LOCKED: i32 = 4;

/// Config file name inside the state directory.
pub const CONFIG_FILE: &str = "spindle.toml";

/// How a command reaches the engine.
pub(crate) enum Backend {
    /// This process holds the store lock (recovery ran on open).
    Local { engine: CliEngine, recovery: RecoveryReport },
    /// `spindle run` holds the lock; requests go over its control socket.
    Remote(ControlClient),
}

/// Configuration plus a way to reach the engine for one state directory.
pub struct Session {
    pub state_dir: PathBuf,
    pub config: EngineConfig,
    pub(crate) backend: Backend,
}

impl Session {
    pub fn open() -> anyhow::Result<Self> {
        Self::open_at(env::state_dir()?)
    }

    /// Open the store, or talk to the `spindle run` that already holds it.
    pub fn open_at(state_dir: PathBuf) -> anyhow::Result<Self> {
        let config = load_config(&state_dir)?;
        let backend = match FileStore::open(&state_dir) {
            Ok(store) => local(store, &config)?,
            Err(StoreError::Locked(_)) => {
                debug!(state_dir = %state_dir.display(), "store is held, using control socket");
                Backend::Remote(ControlClient::new(&state_dir))
            }
            Err(e) => return Err(store_error(e).into()),
        };
        Ok(Self { state_dir, config, backend })
    }

    /// Take the store lock and run recovery, as `spindle run` must.
    pub fn open_exclusive(state_dir: PathBuf) -> anyhow::Result<Self> {
        let config = load_config(&state_dir)?;
        let store = FileStore::open(&state_dir).map_err(store_error)?;
        let backend = local(store, &config)?;
        Ok(Self { state_dir, config, backend })
    }

    #[cfg(test)]
    pub(crate) fn engine(&self) -> &CliEngine {
        match &self.backend {
            Backend::Local { engine, .. } => engine,
            Backend::Remote(_) => panic!("session talks to a running `spindle run`"),
        }
    }

    /// Defaults from config for a new job of `kind`.
    pub fn spec(&self, kind: JobKind) -> JobSpec {
        self.config.spec(kind)
    }

    async fn call(&self, request: Request) -> Result<Response, ExitError> {
        match &self.backend {
            Backend::Local { engine, recovery } => Ok(control::handle(engine, recovery, request)),
            Backend::Remote(client) => Ok(client.send(&request).await?),
        }
    }

    /// Full id for a user-supplied id or unique prefix.
    pub async fn resolve(&self, prefix: &str) -> Result<JobId, ExitError> {
        match self.call(Request::Resolve { prefix: prefix.to_string() }).await? {
            Response::Id { id } => Ok(id),
            other => Err(reject(other)),
        }
    }

    /// Create a job, queueing it unless `enqueue` is false.
    pub async fn create(&self, spec: JobSpec, enqueue: bool) -> Result<Job, ExitError> {
        self.job(Request::Create { spec, enqueue }).await
    }

    pub async fn enqueue(&self, id: &JobId) -> Result<Job, ExitError> {
        self.job(Request::Enqueue { id: id.clone() }).await
    }

    pub async fn get(&self, id: &JobId) -> Result<Job, ExitError> {
        self.job(Request::Get { id: id.clone() }).await
    }

    pub async fn cancel(&self, id: &JobId) -> Result<Job, ExitError> {
        self.job(Request::Cancel { id: id.clone() }).await
    }

    pub async fn retry(&self, id: &JobId) -> Result<Job, ExitError> {
        self.job(Request::Retry { id: id.clone() }).await
    }

    pub async fn list(&self, filter: JobFilter, order: JobOrder) -> Result<Vec<Job>, ExitError> {
        match self.call(Request::List { filter, order }).await? {
            Response::Jobs { jobs } => Ok(jobs),
            other => Err(reject(other)),
        }
    }

    pub async fn stats(&self) -> Result<JobStats, ExitError> {
        match self.call(Request::Stats).await? {
            Response::Stats { stats } => Ok(stats),
            other => Err(reject(other)),
        }
    }

    pub async fn cleanup(&self, older_than: Duration) -> Result<Vec<JobId>, ExitError> {
        let older_than_ms = u64::try_from(older_than.as_millis()).unwrap_or(u64::MAX);
        match self.call(Request::Cleanup { older_than_ms }).await? {
            Response::Removed { ids } => Ok(ids),
            other => Err(reject(other)),
        }
    }

    pub async fn batch(&self, id: &JobId) -> Result<(BatchSummary, Vec<Job>), ExitError> {
        match self.call(Request::Batch { id: id.clone() }).await? {
            Response::Batch { summary, children } => Ok((summary, children)),
            other => Err(reject(other)),
        }
    }

    /// What recovery did when the store was last opened.
    pub async fn recovery(&self) -> Result<RecoveryReport, ExitError> {
        match self.call(Request::Recovery).await? {
            Response::Recovery { report } => Ok(report),
            other => Err(reject(other)),
        }
    }

    async fn job(&self, request: Request) -> Result<Job, ExitError> {
        match self.call(request).await? {
            Response::Job { job } => Ok(*job),
            other => Err(reject(other)),
        }
    }
}

fn local(store: FileStore, config: &EngineConfig) -> Result<Backend, ExitError> {
    let (engine, recovery) =
        Engine::open(store, SystemClock, config.clone()).map_err(ExitError::from)?;
    Ok(Backend::Local { engine, recovery })
}

fn store_error(e: StoreError) -> ExitError {
    match e {
        StoreError::Locked(_) => ExitError::new(
            EXIT_LOCKED,
            format!("{e} (is `spindle run` active for this state directory?)"),
        ),
        other => ExitError::new(1, format!("failed to open job store: {other}")),
    }
}

fn reject(response: Response) -> ExitError {
    match response {
        Response::Error { code, message } => ExitError::new(code, message),
        other => ExitError::new(1, format!("unexpected control response: {other:?}")),
    }
}

impl From<ClientError> for ExitError {
    fn from(e: ClientError) -> Self {
        match e {
            // Locked by a process that is not serving (another command, or a
            // `run` still starting up).
            ClientError::Unreachable { .. } => ExitError::new(EXIT_LOCKED, e.to_string()),
            ClientError::Protocol(_) => ExitError::new(1, e.to_string()),
        }
    }
}

/// `spindle.toml` plus environment overrides.
pub fn load_config(state_dir: &Path) -> Result<EngineConfig, ExitError> {
    let mut config = EngineConfig::load(&state_dir.join(CONFIG_FILE))
        .map_err(|e| ExitError::new(2, e.to_string()))?;
    if let Some(interval) = env::timeout_check_ms() {
        config.timeout_check_interval = interval;
    }
    if let Some(workers) = env::workers() {
        config.workers.concurrency = workers;
    }
    Ok(config)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
