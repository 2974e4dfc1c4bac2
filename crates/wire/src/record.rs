// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fixed-size control record.
//!
//! The original coordinator's literal magic-cookie value lives in a header
//! that was not part of the retrieved grounding source, so `MAGIC_COOKIE`
//! below is this reimplementation's own constant (see DESIGN.md) — what the
//! spec requires is that it be fixed and checked on every record, not that
//! it match an unavailable upstream literal.

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

use dmtcp_core::{MessageType, UniqueProcessId, WorkerState};

pub const MAGIC_COOKIE: u64 = 0xD3D7_C0C0_0000_0001;

/// No-error sentinel for `coord_error_code`, distinct from the protocol's
/// own wire-level error codes (`ERROR_INVALID_COMMAND`, `ERROR_NOT_RUNNING_STATE`).
pub const NOERROR: u32 = 0;
pub const ERROR_INVALID_COMMAND: u32 = 1;
pub const ERROR_NOT_RUNNING_STATE: u32 = 2;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad magic cookie: expected {MAGIC_COOKIE:#x}, got {0:#x}")]
    BadMagic(u64),

    #[error("unknown message type discriminant {0}")]
    UnknownMessageType(u32),

    #[error("unknown worker state discriminant {0}")]
    UnknownWorkerState(u32),

    #[error("message {0:?} must not carry a sentinel sender identity")]
    SentinelSender(MessageType),

    #[error("payload length {actual} does not match extra_bytes {expected}")]
    PayloadMismatch { expected: u32, actual: usize },
}

/// The fixed-size portion of every message: one control record followed by
/// exactly `extra_bytes` bytes of opaque payload (read separately).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRecord {
    pub msg_type: MessageType,
    pub sender: UniqueProcessId,
    /// Identity of the computation the sender believes it belongs to.
    /// Sentinel for bootstrap messages that have not joined one yet.
    pub comp_group: UniqueProcessId,
    pub state: WorkerState,
    pub coord_cmd: u8,
    pub num_peers: u32,
    pub checkpoint_interval: u32,
    pub virtual_pid: u32,
    pub coord_timestamp: u64,
    pub coord_error_code: u32,
    pub key_len: u32,
    pub val_len: u32,
    pub extra_bytes: u32,
}

impl ControlRecord {
    /// Bytes occupied by the fixed record on the wire.
    pub const WIRE_LEN: usize = 8 // magic
        + 4 // msg_type
        + 8 + 4 + 8 + 4 // sender: host_id, pid, start_time, generation
        + 8 + 4 + 8 + 4 // comp_group: host_id, pid, start_time, generation
        + 4 // state
        + 1 // coord_cmd
        + 4 // num_peers
        + 4 // checkpoint_interval
        + 4 // virtual_pid
        + 8 // coord_timestamp
        + 4 // coord_error_code
        + 4 // key_len
        + 4 // val_len
        + 4; // extra_bytes

    pub fn new(msg_type: MessageType, sender: UniqueProcessId, state: WorkerState) -> Self {
        Self {
            msg_type,
            sender,
            comp_group: UniqueProcessId::SENTINEL,
            state,
            coord_cmd: 0,
            num_peers: 0,
            checkpoint_interval: 0,
            virtual_pid: 0,
            coord_timestamp: 0,
            coord_error_code: NOERROR,
            key_len: 0,
            val_len: 0,
            extra_bytes: 0,
        }
    }

    /// Messages exempt from the "sender must not be sentinel" check: tools
    /// that address the coordinator without a DMTCP process identity of
    /// their own.
    fn sentinel_sender_allowed(msg_type: MessageType) -> bool {
        matches!(msg_type, MessageType::GetVirtualPid | MessageType::UserCmd)
    }

    /// Validate invariants that hold for every record regardless of direction.
    pub fn assert_valid(&self) -> Result<(), ProtocolError> {
        if self.sender.is_sentinel() && !Self::sentinel_sender_allowed(self.msg_type) {
            return Err(ProtocolError::SentinelSender(self.msg_type));
        }
        Ok(())
    }

    pub fn encode(&self) -> [u8; Self::WIRE_LEN] {
        let mut buf = [0u8; Self::WIRE_LEN];
        let mut offset = 0;

        LittleEndian::write_u64(&mut buf[offset..], MAGIC_COOKIE);
        offset += 8;
        LittleEndian::write_u32(&mut buf[offset..], self.msg_type.wire_value());
        offset += 4;
        LittleEndian::write_u64(&mut buf[offset..], self.sender.host_id);
        offset += 8;
        LittleEndian::write_u32(&mut buf[offset..], self.sender.pid);
        offset += 4;
        LittleEndian::write_u64(&mut buf[offset..], self.sender.start_time);
        offset += 8;
        LittleEndian::write_u32(&mut buf[offset..], self.sender.generation);
        offset += 4;
        LittleEndian::write_u64(&mut buf[offset..], self.comp_group.host_id);
        offset += 8;
        LittleEndian::write_u32(&mut buf[offset..], self.comp_group.pid);
        offset += 4;
        LittleEndian::write_u64(&mut buf[offset..], self.comp_group.start_time);
        offset += 8;
        LittleEndian::write_u32(&mut buf[offset..], self.comp_group.generation);
        offset += 4;
        LittleEndian::write_u32(&mut buf[offset..], self.state.wire_value());
        offset += 4;
        buf[offset] = self.coord_cmd;
        offset += 1;
        LittleEndian::write_u32(&mut buf[offset..], self.num_peers);
        offset += 4;
        LittleEndian::write_u32(&mut buf[offset..], self.checkpoint_interval);
        offset += 4;
        LittleEndian::write_u32(&mut buf[offset..], self.virtual_pid);
        offset += 4;
        LittleEndian::write_u64(&mut buf[offset..], self.coord_timestamp);
        offset += 8;
        LittleEndian::write_u32(&mut buf[offset..], self.coord_error_code);
        offset += 4;
        LittleEndian::write_u32(&mut buf[offset..], self.key_len);
        offset += 4;
        LittleEndian::write_u32(&mut buf[offset..], self.val_len);
        offset += 4;
        LittleEndian::write_u32(&mut buf[offset..], self.extra_bytes);
        offset += 4;

        debug_assert_eq!(offset, Self::WIRE_LEN);
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        debug_assert!(buf.len() >= Self::WIRE_LEN);
        let mut offset = 0;

        let magic = LittleEndian::read_u64(&buf[offset..]);
        offset += 8;
        if magic != MAGIC_COOKIE {
            return Err(ProtocolError::BadMagic(magic));
        }

        let msg_type_raw = LittleEndian::read_u32(&buf[offset..]);
        offset += 4;
        let msg_type = MessageType::from_wire_value(msg_type_raw)
            .ok_or(ProtocolError::UnknownMessageType(msg_type_raw))?;

        let host_id = LittleEndian::read_u64(&buf[offset..]);
        offset += 8;
        let pid = LittleEndian::read_u32(&buf[offset..]);
        offset += 4;
        let start_time = LittleEndian::read_u64(&buf[offset..]);
        offset += 8;
        let generation = LittleEndian::read_u32(&buf[offset..]);
        offset += 4;
        let sender = UniqueProcessId::new(host_id, pid, start_time, generation);

        let cg_host_id = LittleEndian::read_u64(&buf[offset..]);
        offset += 8;
        let cg_pid = LittleEndian::read_u32(&buf[offset..]);
        offset += 4;
        let cg_start_time = LittleEndian::read_u64(&buf[offset..]);
        offset += 8;
        let cg_generation = LittleEndian::read_u32(&buf[offset..]);
        offset += 4;
        let comp_group = UniqueProcessId::new(cg_host_id, cg_pid, cg_start_time, cg_generation);

        let state_raw = LittleEndian::read_u32(&buf[offset..]);
        offset += 4;
        let state = WorkerState::from_wire_value(state_raw)
            .ok_or(ProtocolError::UnknownWorkerState(state_raw))?;

        let coord_cmd = buf[offset];
        offset += 1;
        let num_peers = LittleEndian::read_u32(&buf[offset..]);
        offset += 4;
        let checkpoint_interval = LittleEndian::read_u32(&buf[offset..]);
        offset += 4;
        let virtual_pid = LittleEndian::read_u32(&buf[offset..]);
        offset += 4;
        let coord_timestamp = LittleEndian::read_u64(&buf[offset..]);
        offset += 8;
        let coord_error_code = LittleEndian::read_u32(&buf[offset..]);
        offset += 4;
        let key_len = LittleEndian::read_u32(&buf[offset..]);
        offset += 4;
        let val_len = LittleEndian::read_u32(&buf[offset..]);
        offset += 4;
        let extra_bytes = LittleEndian::read_u32(&buf[offset..]);
        offset += 4;

        debug_assert_eq!(offset, Self::WIRE_LEN);

        let record = ControlRecord {
            msg_type,
            sender,
            comp_group,
            state,
            coord_cmd,
            num_peers,
            checkpoint_interval,
            virtual_pid,
            coord_timestamp,
            coord_error_code,
            key_len,
            val_len,
            extra_bytes,
        };
        record.assert_valid()?;
        Ok(record)
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
