// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry policy: what happens after a job lands in `failed` or `timeout`.

use serde::{Deserialize, Serialize};

/// Why an attempt ended without success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Executor reported an error that may succeed on another try
    Execution,
    /// Executor reported an error that will not go away on retry
    Fatal,
    /// Timeout Monitor fired
    Timeout,
    /// Job was running when the process went away
    Interrupted,
    /// Batch parent rolled up a failed child
    Batch,
}

impl FailureKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, FailureKind::Execution | FailureKind::Timeout | FailureKind::Interrupted)
    }
}

crate::simple_display! {
    FailureKind {
        Execution => "execution",
        Fatal => "fatal",
        Timeout => "timeout",
        Interrupted => "interrupted",
        Batch => "batch",
    }
}

/// Outcome of consulting the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Re-enter the queue
    Requeue,
    /// `attempts == max_attempts`; terminal for good
    Exhausted,
    /// The failure kind is never retried automatically
    NotRetryable,
}

/// Decide whether a failed attempt is re-queued.
///
/// `attempts` already counts the attempt that just failed.
pub fn decide(attempts: u32, max_attempts: u32, kind: FailureKind) -> RetryDecision {
    if !kind.is_retryable() {
        RetryDecision::NotRetryable
    } else if attempts < max_attempts {
        RetryDecision::Requeue
    } else {
        RetryDecision::Exhausted
    }
}

/// An executor-reported failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub message: String,
    pub retryable: bool,
}

impl Failure {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self { message: message.into(), retryable: true }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self { message: message.into(), retryable: false }
    }

    pub fn kind(&self) -> FailureKind {
        if self.retryable {
            FailureKind::Execution
        } else {
            FailureKind::Fatal
        }
    }
}

impl From<String> for Failure {
    fn from(message: String) -> Self {
        Failure::retryable(message)
    }
}

impl From<&str> for Failure {
    fn from(message: &str) -> Self {
        Failure::retryable(message)
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
