// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The coordinator's state: one struct owned entirely by the task running
//! the event loop. Nothing here touches a socket; I/O effects are returned
//! as [`Effect`] values for the event loop to carry out.

use std::collections::HashMap;

use dmtcp_core::{Clock, ComputationId};

use crate::client::{ClientId, ClientRegistry};
use crate::lookup::LookupService;
use crate::options::Options;
use crate::vpid::VirtualPidAllocator;

/// What a pending blocking operator command is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingReplyKind {
    /// A blocking `c`; reply with DMT_USER_CMD_RESULT once DMT_DO_RESUME fires.
    CheckpointComplete,
}

pub struct Coordinator<C: Clock> {
    pub options: Options,
    pub registry: ClientRegistry,
    pub vpid: VirtualPidAllocator,
    pub lookup: LookupService,
    pub clock: C,

    pub computation_id: ComputationId,
    pub coord_timestamp: u64,
    pub restart_filenames: HashMap<String, Vec<String>>,

    /// Total peers expected, authoritative during restart bootstrap; during
    /// a live computation this tracks `registry.len()` at the moment a
    /// barrier-driving broadcast is sent.
    pub num_peers: u32,

    pub local_prefix: Option<String>,
    pub local_host_name: Option<String>,
    pub remote_prefix: Option<String>,

    pub kill_in_progress: bool,
    pub workers_running_and_suspend_msg_sent: bool,
    pub is_restarting: bool,
    pub blocking_next_checkpoint: bool,
    pub pending_reply: Option<(ClientId, PendingReplyKind)>,

    /// Effective checkpoint interval in seconds, possibly raised for this
    /// computation only via the `i` command from a worker's dmtcpaware path.
    pub checkpoint_interval_seconds: u32,
    /// The configured default, restored when the per-computation override
    /// created by a worker-side `i` is no longer needed (last client gone).
    pub default_checkpoint_interval_seconds: u32,

    next_client_id: u64,
}

impl<C: Clock> Coordinator<C> {
    pub fn new(options: Options, clock: C) -> Self {
        let default_interval = options.checkpoint_interval_seconds;
        Self {
            options,
            registry: ClientRegistry::new(),
            vpid: VirtualPidAllocator::new(),
            lookup: LookupService::new(),
            clock,
            computation_id: ComputationId::SENTINEL,
            coord_timestamp: 0,
            restart_filenames: HashMap::new(),
            num_peers: 0,
            local_prefix: None,
            local_host_name: None,
            remote_prefix: None,
            kill_in_progress: false,
            workers_running_and_suspend_msg_sent: false,
            is_restarting: false,
            blocking_next_checkpoint: false,
            pending_reply: None,
            checkpoint_interval_seconds: default_interval,
            default_checkpoint_interval_seconds: default_interval,
            next_client_id: 0,
        }
    }

    pub fn next_client_id(&mut self) -> ClientId {
        let id = ClientId(self.next_client_id);
        self.next_client_id += 1;
        id
    }

    /// Handles a client going away, regardless of cause (clean disconnect,
    /// protocol fault, or operator kill). Resets computation-scoped state
    /// once the last peer is gone.
    pub fn on_client_removed(&mut self, client_id: ClientId) -> Option<crate::effect::Effect> {
        self.registry.remove(client_id);
        if self.registry.is_empty() {
            self.computation_id = ComputationId::SENTINEL;
            self.coord_timestamp = 0;
            self.kill_in_progress = false;
            self.workers_running_and_suspend_msg_sent = false;
            self.is_restarting = false;
            self.blocking_next_checkpoint = false;
            self.pending_reply = None;
            self.restart_filenames.clear();
            self.lookup.reset();
            self.checkpoint_interval_seconds = self.default_checkpoint_interval_seconds;
            if self.options.exit_on_last {
                return Some(crate::effect::Effect::Exit(0));
            }
        }
        None
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
