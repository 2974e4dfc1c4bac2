// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client registry: per-connection metadata, independent of the socket that
//! carries it. The event loop owns sockets; the registry owns everything the
//! phase engine needs to reason about.

use std::collections::HashMap;

use dmtcp_core::{UniqueProcessId, WorkerState};

/// Identifies one registered connection. Assigned from a monotonic counter,
/// distinct from the virtual PID (which is reused from a bounded pool).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

#[derive(Debug, Clone)]
pub struct ClientRecord {
    pub client_id: ClientId,
    pub identity: UniqueProcessId,
    pub virtual_pid: u32,
    pub hostname: String,
    pub program: String,
    pub prefix_dir: Option<String>,
    pub client_number: u64,
    pub state: WorkerState,
    pub is_restart_driver: bool,
}

/// Per-connection metadata for every currently-admitted worker.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<ClientId, ClientRecord>,
    next_client_number: u64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        client_id: ClientId,
        identity: UniqueProcessId,
        virtual_pid: u32,
        hostname: String,
        program: String,
        prefix_dir: Option<String>,
        state: WorkerState,
    ) -> &ClientRecord {
        let client_number = self.next_client_number;
        self.next_client_number += 1;
        let record = ClientRecord {
            client_id,
            identity,
            virtual_pid,
            hostname,
            program,
            prefix_dir,
            client_number,
            state,
            is_restart_driver: false,
        };
        self.clients.entry(client_id).or_insert(record)
    }

    pub fn remove(&mut self, client_id: ClientId) -> Option<ClientRecord> {
        self.clients.remove(&client_id)
    }

    pub fn get(&self, client_id: ClientId) -> Option<&ClientRecord> {
        self.clients.get(&client_id)
    }

    pub fn get_mut(&mut self, client_id: ClientId) -> Option<&mut ClientRecord> {
        self.clients.get_mut(&client_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClientRecord> {
        self.clients.values()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn live_virtual_pids(&self) -> std::collections::HashSet<u32> {
        self.clients.values().map(|c| c.virtual_pid).collect()
    }

    /// Minimum [`WorkerState`] across all registered clients, or `UNKNOWN` when empty.
    pub fn min_state(&self) -> WorkerState {
        self.clients.values().map(|c| c.state).min().unwrap_or(WorkerState::Unknown)
    }

    /// Maximum [`WorkerState`] across all registered clients, or `UNKNOWN` when empty.
    pub fn max_state(&self) -> WorkerState {
        self.clients.values().map(|c| c.state).max().unwrap_or(WorkerState::Unknown)
    }

    /// True when every registered client reports the same state.
    pub fn unanimous(&self) -> bool {
        let mut states = self.clients.values().map(|c| c.state);
        match states.next() {
            None => true,
            Some(first) => states.all(|s| s == first),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
