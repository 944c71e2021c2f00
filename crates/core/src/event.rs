// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transition notifications delivered to subscribers.

use serde::{Deserialize, Serialize};

use crate::job::{JobId, JobStatus};

/// One accepted status transition.
///
/// Emitted after the new state is durable. Listeners are informed, never
/// consulted: the store stays the source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub job_id: JobId,
    pub from: JobStatus,
    pub to: JobStatus,
    /// 1-based attempt the transition belongs to
    #[serde(default)]
    pub attempt: u32,
    pub at_ms: u64,
}

impl TransitionEvent {
    /// True when the job left `running` (executors treat this as a stop signal).
    pub fn left_running(&self) -> bool {
        self.from == JobStatus::Running && self.to != JobStatus::Running
    }
}
