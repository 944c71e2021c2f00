// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Job Record Store: durable keyed storage for job state.

mod file;
mod memory;
mod record;
mod store;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use record::{StoredJob, CURRENT_RECORD_VERSION};
pub use store::{JobStore, StoreError};
