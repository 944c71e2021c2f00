// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control channel between CLI commands and a running `spindle run`.

mod client;
mod protocol;
mod server;
mod wire;

use std::path::{Path, PathBuf};

pub use client::{ClientError, ControlClient};
pub use protocol::{Request, Response};
pub use server::{handle, ControlServer};

/// Socket file inside the state directory.
pub const SOCKET_FILE: &str = "spindle.sock";

pub fn socket_path(state_dir: &Path) -> PathBuf {
    state_dir.join(SOCKET_FILE)
}
