// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use byteorder::ByteOrder;

fn worker_identity() -> UniqueProcessId {
    UniqueProcessId::new(0xAABB, 4242, 1_700_000_000, 3)
}

#[test]
fn encode_decode_roundtrips() {
    let mut record = ControlRecord::new(MessageType::Ok, worker_identity(), WorkerState::Suspended);
    record.comp_group = UniqueProcessId::new(1, 1, 1_700_000_000, 2);
    record.num_peers = 7;
    record.coord_timestamp = 123456;
    record.extra_bytes = 16;

    let bytes = record.encode();
    let decoded = ControlRecord::decode(&bytes).expect("decode should succeed");
    assert_eq!(decoded, record);
}

#[test]
fn comp_group_defaults_to_sentinel() {
    let record = ControlRecord::new(MessageType::Ok, worker_identity(), WorkerState::Running);
    assert!(record.comp_group.is_sentinel());
}

#[test]
fn bad_magic_is_rejected() {
    let record = ControlRecord::new(MessageType::Ok, worker_identity(), WorkerState::Running);
    let mut bytes = record.encode();
    bytes[0] ^= 0xFF;
    let err = ControlRecord::decode(&bytes).unwrap_err();
    assert!(matches!(err, ProtocolError::BadMagic(_)));
}

#[test]
fn unknown_message_type_is_rejected() {
    let record = ControlRecord::new(MessageType::Ok, worker_identity(), WorkerState::Running);
    let mut bytes = record.encode();
    write_u32_at(&mut bytes, 8, 9999);
    let err = ControlRecord::decode(&bytes).unwrap_err();
    assert!(matches!(err, ProtocolError::UnknownMessageType(9999)));
}

#[test]
fn sentinel_sender_rejected_for_ordinary_messages() {
    let record = ControlRecord::new(MessageType::Ok, UniqueProcessId::SENTINEL, WorkerState::Running);
    let err = record.assert_valid().unwrap_err();
    assert!(matches!(err, ProtocolError::SentinelSender(MessageType::Ok)));
}

#[yare::parameterized(
    get_virtual_pid = { MessageType::GetVirtualPid },
    user_cmd = { MessageType::UserCmd },
)]
fn sentinel_sender_allowed_for_bootstrap_messages(msg_type: MessageType) {
    let record = ControlRecord::new(msg_type, UniqueProcessId::SENTINEL, WorkerState::Unknown);
    assert!(record.assert_valid().is_ok());
}

#[test]
fn wire_len_matches_encoded_buffer_length() {
    let record = ControlRecord::new(MessageType::Ok, worker_identity(), WorkerState::Running);
    assert_eq!(record.encode().len(), ControlRecord::WIRE_LEN);
}

// Writes a little-endian u32 at a byte offset; used to corrupt an
// otherwise-valid encoded record for negative tests.
fn write_u32_at(buf: &mut [u8], offset: usize, value: u32) {
    byteorder::LittleEndian::write_u32(&mut buf[offset..], value);
}
