// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! spindle-core: job model, state machine and pure scheduling policies.

pub mod macros;

pub mod batch;
pub mod clock;
pub mod error;
pub mod event;
pub mod filter;
pub mod id;
pub mod job;
pub mod patch;
pub mod retry;
pub mod stats;
pub mod transition;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use batch::{finalize_path, BatchOutcome, BatchSummary};
pub use clock::{Clock, FakeClock, SystemClock};
pub use error::{TransitionError, ValidationError};
pub use event::TransitionEvent;
pub use filter::{JobFilter, JobOrder};
#[cfg(any(test, feature = "test-support"))]
pub use job::JobBuilder;
pub use job::{
    Job, JobId, JobKind, JobSpec, JobStatus, PRIORITY_BACKGROUND, PRIORITY_DEFAULT, PRIORITY_USER,
};
pub use patch::JobPatch;
pub use retry::{Failure, FailureKind, RetryDecision};
pub use stats::JobStats;
pub use transition::Transition;
