// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration (`spindle.toml`).
//!
//! ```toml
//! default_max_attempts = 3
//! default_timeout_secs = 3600
//! timeout_check_interval = "5s"
//! cancel_grace_period = "10s"
//!
//! [workers]
//! concurrency = 2
//! poll_interval = "1s"
//!
//! [executors.analyze]
//! command = "python3"
//! args = ["workers/tempo_worker.py"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use spindle_core::job::MAX_ATTEMPTS_LIMIT;
use spindle_core::{JobKind, JobSpec};
use thiserror::Error;

use crate::duration::serde_str;

fn default_max_attempts() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    3600
}

fn default_timeout_check_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_cancel_grace_period() -> Duration {
    Duration::from_secs(10)
}

fn default_concurrency() -> usize {
    2
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

/// Errors loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("failed to parse {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Applied to new jobs that don't set `max_attempts`
    #[serde(default = "default_max_attempts")]
    pub default_max_attempts: u32,
    /// Applied to new jobs that don't set a timeout
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,
    /// How often the Timeout Monitor scans running jobs
    #[serde(default = "default_timeout_check_interval", with = "serde_str")]
    pub timeout_check_interval: Duration,
    /// SIGTERM to SIGKILL delay for cancelled subprocesses
    #[serde(default = "default_cancel_grace_period", with = "serde_str")]
    pub cancel_grace_period: Duration,
    #[serde(default)]
    pub workers: WorkerConfig,
    /// Subprocess executors keyed by job type (`analyze`, `stem-separation`, ...)
    #[serde(default)]
    pub executors: BTreeMap<String, ExecutorConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerConfig {
    /// Max jobs executing at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Fallback poll period when no queued events arrive
    #[serde(default = "default_poll_interval", with = "serde_str")]
    pub poll_interval: Duration,
}

/// An external worker program for one job type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutorConfig {
    pub command: String,
    /// Arguments placed before `--job-id` / `--parameters`
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { concurrency: default_concurrency(), poll_interval: default_poll_interval() }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_max_attempts: default_max_attempts(),
            default_timeout_secs: default_timeout_secs(),
            timeout_check_interval: default_timeout_check_interval(),
            cancel_grace_period: default_cancel_grace_period(),
            workers: WorkerConfig::default(),
            executors: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Io { path: path.to_path_buf(), source }),
        };
        let config: Self = toml::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_max_attempts == 0 || self.default_max_attempts > MAX_ATTEMPTS_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "default_max_attempts must be in 1..={MAX_ATTEMPTS_LIMIT}, got {}",
                self.default_max_attempts
            )));
        }
        if self.default_timeout_secs == 0 {
            return Err(ConfigError::Invalid("default_timeout_secs must be > 0".into()));
        }
        if self.timeout_check_interval.is_zero() {
            return Err(ConfigError::Invalid("timeout_check_interval must be > 0".into()));
        }
        if self.workers.concurrency == 0 {
            return Err(ConfigError::Invalid("workers.concurrency must be > 0".into()));
        }
        if self.workers.poll_interval.is_zero() {
            return Err(ConfigError::Invalid("workers.poll_interval must be > 0".into()));
        }
        for (kind, exec) in &self.executors {
            kind.parse::<JobKind>().map_err(|e| ConfigError::Invalid(e.to_string()))?;
            if exec.command.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("executors.{kind}.command is empty")));
            }
        }
        Ok(())
    }

    /// A job description carrying this config's defaults.
    pub fn spec(&self, kind: JobKind) -> JobSpec {
        JobSpec::new(kind)
            .max_attempts(self.default_max_attempts)
            .timeout_secs(self.default_timeout_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
