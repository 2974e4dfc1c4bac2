// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dmtcp_core::{MessageType, UniqueProcessId, WorkerState};

#[tokio::test]
async fn write_then_read_roundtrips_a_message_with_payload() {
    let mut record = ControlRecord::new(
        MessageType::CkptFilename,
        UniqueProcessId::new(9, 1, 100, 0),
        WorkerState::Checkpointed,
    );
    let payload = Message::encode_ckpt_filename_payload("img.dmtcp", "nodeA");
    record.extra_bytes = payload.len() as u32;
    let message = Message::new(record, payload).unwrap();

    let mut buffer = Vec::new();
    write_message(&mut buffer, &message).await.unwrap();

    let mut cursor = std::io::Cursor::new(buffer);
    let read_back = read_message(&mut cursor).await.unwrap();
    assert_eq!(read_back, message);
}

#[tokio::test]
async fn write_then_read_roundtrips_a_message_with_no_payload() {
    let record = ControlRecord::new(
        MessageType::Ok,
        UniqueProcessId::new(1, 1, 1, 0),
        WorkerState::Running,
    );
    let message = Message::new(record, Vec::new()).unwrap();

    let mut buffer = Vec::new();
    write_message(&mut buffer, &message).await.unwrap();
    assert_eq!(buffer.len(), ControlRecord::WIRE_LEN);

    let mut cursor = std::io::Cursor::new(buffer);
    let read_back = read_message(&mut cursor).await.unwrap();
    assert_eq!(read_back, message);
}

#[tokio::test]
async fn truncated_record_is_a_protocol_error() {
    let mut cursor = std::io::Cursor::new(vec![0u8; ControlRecord::WIRE_LEN - 1]);
    let err = read_message(&mut cursor).await.unwrap_err();
    assert!(matches!(err, ProtocolError::Io(_)));
}
