// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The barrier states every worker progresses through together.
//!
//! Declaration order is the comparison order: `derive(PartialOrd, Ord)`
//! compares enums by variant position, so the order below — not the
//! `#[repr(u32)]` discriminants — is what makes `minState`/`maxState`
//! computation correct. The discriminants are fixed explicitly because
//! they cross the wire and are part of the protocol ABI.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum WorkerState {
    Unknown = 0,
    Running = 1,
    Suspended = 2,
    FdLeaderElection = 3,
    Drained = 4,
    Restarting = 5,
    Checkpointed = 6,
    NameServiceDataRegistered = 7,
    DoneQuerying = 8,
    Refilled = 9,
}

impl WorkerState {
    pub const ALL: [WorkerState; 10] = [
        WorkerState::Unknown,
        WorkerState::Running,
        WorkerState::Suspended,
        WorkerState::FdLeaderElection,
        WorkerState::Drained,
        WorkerState::Restarting,
        WorkerState::Checkpointed,
        WorkerState::NameServiceDataRegistered,
        WorkerState::DoneQuerying,
        WorkerState::Refilled,
    ];

    pub const fn wire_value(self) -> u32 {
        self as u32
    }

    pub fn from_wire_value(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.wire_value() == value)
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WorkerState::Unknown => "UNKNOWN",
            WorkerState::Running => "RUNNING",
            WorkerState::Suspended => "SUSPENDED",
            WorkerState::FdLeaderElection => "FD_LEADER_ELECTION",
            WorkerState::Drained => "DRAINED",
            WorkerState::Restarting => "RESTARTING",
            WorkerState::Checkpointed => "CHECKPOINTED",
            WorkerState::NameServiceDataRegistered => "NAME_SERVICE_DATA_REGISTERED",
            WorkerState::DoneQuerying => "DONE_QUERYING",
            WorkerState::Refilled => "REFILLED",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
#[path = "worker_state_tests.rs"]
mod tests;
