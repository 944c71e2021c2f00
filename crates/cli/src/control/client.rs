// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client side of the control socket.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::net::UnixStream;

use super::protocol::{Request, Response};
use super::wire::{self, ProtocolError};
use super::socket_path;
use crate::env::ipc_timeout;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no `spindle run` answered on {}: {source}", .path.display())]
    Unreachable { path: PathBuf, source: std::io::Error },

    #[error("control socket: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Sends requests to the `spindle run` serving a state directory.
#[derive(Debug, Clone)]
pub struct ControlClient {
    path: PathBuf,
    timeout: Duration,
}

impl ControlClient {
    pub fn new(state_dir: &Path) -> Self {
        Self { path: socket_path(state_dir), timeout: ipc_timeout() }
    }

    /// One request per connection.
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        let connect = tokio::time::timeout(self.timeout, UnixStream::connect(&self.path)).await;
        let mut stream = match connect {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(ClientError::Unreachable { path: self.path.clone(), source }),
            Err(_) => {
                return Err(ClientError::Unreachable {
                    path: self.path.clone(),
                    source: std::io::ErrorKind::TimedOut.into(),
                })
            }
        };
        wire::write_frame(&mut stream, request, self.timeout).await?;
        Ok(wire::read_frame(&mut stream, self.timeout).await?)
    }
}
