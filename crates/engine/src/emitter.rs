// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event Emitter: fan-out of accepted transitions.
//!
//! Two delivery paths share one publish call: synchronous callbacks
//! registered with [`EventEmitter::on_transition`], and an async broadcast
//! channel for tokio consumers (the worker pool, the CLI `run` loop).
//! Events are published after the store write, outside any job lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use spindle_core::TransitionEvent;
use tokio::sync::broadcast;

/// Channel capacity for the broadcast path; slow receivers see `Lagged`.
const BROADCAST_CAPACITY: usize = 1024;

type Callback = Arc<dyn Fn(&TransitionEvent) + Send + Sync>;

/// Handle returned by [`EventEmitter::on_transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub struct EventEmitter {
    listeners: RwLock<Vec<(ListenerId, Callback)>>,
    next_id: AtomicU64,
    sender: broadcast::Sender<TransitionEvent>,
}

impl Default for EventEmitter {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { listeners: RwLock::new(Vec::new()), next_id: AtomicU64::new(1), sender }
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listeners.read().len())
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

impl EventEmitter {
    pub fn on_transition<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&TransitionEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(callback)));
        id
    }

    /// Returns false if the listener was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransitionEvent> {
        self.sender.subscribe()
    }

    pub(crate) fn publish(&self, events: &[TransitionEvent]) {
        if events.is_empty() {
            return;
        }
        // Snapshot so callbacks may register/remove listeners without deadlocking.
        let listeners: Vec<Callback> =
            self.listeners.read().iter().map(|(_, cb)| Arc::clone(cb)).collect();
        for event in events {
            tracing::info!(
                job_id = %event.job_id,
                from = %event.from,
                to = %event.to,
                "job transition"
            );
            for callback in &listeners {
                callback(event);
            }
            // No receivers is fine: polling is always a valid fallback.
            let _ = self.sender.send(event.clone());
        }
    }
}

#[cfg(test)]
#[path = "emitter_tests.rs"]
mod tests;
