// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The coordinator's wire message types.
//!
//! Numeric values are part of the ABI (see `dmtcp-wire`'s control record)
//! and are fixed explicitly rather than left to declaration order. The
//! grounding C++ header defining the original literal values was not part
//! of the retrieved source tree, so these discriminants are this
//! reimplementation's own stable numbering (documented in DESIGN.md);
//! what matters per the spec is that the declared order is preserved and
//! future additions never renumber an existing variant.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageType {
    // --- from worker ---
    HelloCoordinator = 1,
    RestartProcess = 2,
    Ok = 3,
    CkptFilename = 4,
    UpdateProcessInfoAfterFork = 5,
    GetVirtualPid = 6,
    RegisterNameServiceData = 7,
    NameServiceQuery = 8,
    UserCmd = 9,

    // --- from coordinator ---
    HelloWorker = 20,
    RestartProcessReply = 21,
    GetVirtualPidResult = 22,
    UserCmdResult = 23,
    Reject = 24,
    KillPeer = 25,
    ForceRestart = 26,
    DoSuspend = 27,
    DoFdLeaderElection = 28,
    DoDrain = 29,
    DoCheckpoint = 30,
    DoRegisterNameServiceData = 31,
    DoSendQueries = 32,
    DoRefill = 33,
    DoResume = 34,
    NameServiceQueryResponse = 35,
}

impl MessageType {
    const ALL: [MessageType; 25] = [
        MessageType::HelloCoordinator,
        MessageType::RestartProcess,
        MessageType::Ok,
        MessageType::CkptFilename,
        MessageType::UpdateProcessInfoAfterFork,
        MessageType::GetVirtualPid,
        MessageType::RegisterNameServiceData,
        MessageType::NameServiceQuery,
        MessageType::UserCmd,
        MessageType::HelloWorker,
        MessageType::RestartProcessReply,
        MessageType::GetVirtualPidResult,
        MessageType::UserCmdResult,
        MessageType::Reject,
        MessageType::KillPeer,
        MessageType::ForceRestart,
        MessageType::DoSuspend,
        MessageType::DoFdLeaderElection,
        MessageType::DoDrain,
        MessageType::DoCheckpoint,
        MessageType::DoRegisterNameServiceData,
        MessageType::DoSendQueries,
        MessageType::DoRefill,
        MessageType::DoResume,
        MessageType::NameServiceQueryResponse,
    ];

    pub const fn wire_value(self) -> u32 {
        self as u32
    }

    pub fn from_wire_value(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.wire_value() == value)
    }

    /// Messages a worker is permitted to originate.
    pub const fn is_from_worker(self) -> bool {
        matches!(
            self,
            MessageType::HelloCoordinator
                | MessageType::RestartProcess
                | MessageType::Ok
                | MessageType::CkptFilename
                | MessageType::UpdateProcessInfoAfterFork
                | MessageType::GetVirtualPid
                | MessageType::RegisterNameServiceData
                | MessageType::NameServiceQuery
                | MessageType::UserCmd
        )
    }

    /// Messages only the coordinator ever sends.
    pub const fn is_from_coordinator(self) -> bool {
        !self.is_from_worker()
    }

    /// The phase-driver broadcasts emitted by the phase engine, in barrier order.
    pub const fn is_phase_driver(self) -> bool {
        matches!(
            self,
            MessageType::DoSuspend
                | MessageType::DoFdLeaderElection
                | MessageType::DoDrain
                | MessageType::DoCheckpoint
                | MessageType::DoRegisterNameServiceData
                | MessageType::DoSendQueries
                | MessageType::DoRefill
                | MessageType::DoResume
        )
    }
}

#[cfg(test)]
#[path = "message_type_tests.rs"]
mod tests;
