// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use dmtcp_core::{ComputationId, FakeClock, MessageType, UniqueProcessId, WorkerState};
use dmtcp_wire::ControlRecord;

use super::*;
use crate::options::Options;

fn test_options() -> Options {
    Options {
        port: 0,
        checkpoint_dir: "/tmp".into(),
        tmp_dir: "/tmp".into(),
        checkpoint_interval_seconds: 0,
        exit_on_last: false,
        background: false,
        batch: false,
    }
}

fn hello_payload(hostname: &str, program: &str, prefix: Option<&str>) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(hostname.as_bytes());
    bytes.push(0);
    bytes.extend_from_slice(program.as_bytes());
    bytes.push(0);
    if let Some(prefix) = prefix {
        bytes.extend_from_slice(prefix.as_bytes());
        bytes.push(0);
    }
    bytes
}

fn hello_msg(sender: UniqueProcessId, state: WorkerState, payload: Vec<u8>) -> Message {
    let mut record = ControlRecord::new(MessageType::HelloCoordinator, sender, state);
    record.extra_bytes = payload.len() as u32;
    Message::new(record, payload).expect("valid message")
}

#[test]
fn get_virtual_pid_allocates_from_the_pool() {
    let mut coord = Coordinator::new(test_options(), FakeClock::new());
    let record = ControlRecord::new(MessageType::GetVirtualPid, UniqueProcessId::SENTINEL, WorkerState::Unknown);
    let msg = Message::new(record, Vec::new()).expect("valid message");
    let effects = classify_and_admit(&mut coord, ClientId(0), &msg);
    match &effects[0] {
        Effect::Send(_, reply) => assert!(reply.record.virtual_pid >= crate::vpid::VIRTUAL_PID_MIN),
        other => panic!("expected Send, got {other:?}"),
    }
    assert!(matches!(effects[1], Effect::Close(_)));
}

#[test]
fn first_hello_establishes_the_computation_and_admits() {
    let mut coord = Coordinator::new(test_options(), FakeClock::new());
    let sender = UniqueProcessId::new(1, 100, 1_700_000_000, 0);
    let msg = hello_msg(sender, WorkerState::Unknown, hello_payload("hostA", "prog", None));

    let effects = classify_and_admit(&mut coord, ClientId(0), &msg);

    assert_eq!(coord.computation_id, ComputationId(sender));
    assert_eq!(coord.registry.len(), 1);
    assert!(matches!(effects[0], Effect::Send(ClientId(0), _)));
}

#[test]
fn second_worker_from_a_different_host_records_remote_prefix() {
    let mut coord = Coordinator::new(test_options(), FakeClock::new());
    let first = UniqueProcessId::new(1, 100, 1_700_000_000, 0);
    let msg1 = hello_msg(first, WorkerState::Unknown, hello_payload("hostA", "prog", Some("/opt/dmtcp")));
    classify_and_admit(&mut coord, ClientId(0), &msg1);

    let second = UniqueProcessId::new(2, 200, 1_700_000_001, 0);
    let msg2 = hello_msg(second, WorkerState::Unknown, hello_payload("hostB", "prog", Some("/opt/remote")));
    let effects = classify_and_admit(&mut coord, ClientId(1), &msg2);

    assert_eq!(coord.remote_prefix.as_deref(), Some("/opt/remote"));
    assert_eq!(coord.registry.len(), 2);
    assert!(matches!(effects[0], Effect::Send(ClientId(1), _)));
}

#[test]
fn same_host_worker_with_mismatched_prefix_is_rejected() {
    let mut coord = Coordinator::new(test_options(), FakeClock::new());
    let first = UniqueProcessId::new(1, 100, 1_700_000_000, 0);
    let msg1 = hello_msg(first, WorkerState::Unknown, hello_payload("hostA", "prog", Some("/opt/dmtcp")));
    classify_and_admit(&mut coord, ClientId(0), &msg1);

    let second = UniqueProcessId::new(1, 101, 1_700_000_001, 0);
    let msg2 = hello_msg(second, WorkerState::Unknown, hello_payload("hostA", "prog", Some("/opt/other")));
    let effects = classify_and_admit(&mut coord, ClientId(1), &msg2);

    assert_eq!(coord.registry.len(), 1);
    assert!(matches!(effects.last(), Some(Effect::Close(ClientId(1)))));
}

#[test]
fn hello_with_nonzero_comp_group_while_running_is_rejected() {
    let mut coord = Coordinator::new(test_options(), FakeClock::new());
    let first = UniqueProcessId::new(1, 100, 1_700_000_000, 0);
    classify_and_admit(&mut coord, ClientId(0), &hello_msg(first, WorkerState::Unknown, hello_payload("hostA", "prog", None)));

    let mut record = ControlRecord::new(MessageType::HelloCoordinator, UniqueProcessId::new(9, 9, 9, 9), WorkerState::Unknown);
    record.comp_group = UniqueProcessId::new(9, 9, 9, 9);
    let payload = hello_payload("hostC", "prog", None);
    record.extra_bytes = payload.len() as u32;
    let msg = Message::new(record, payload).expect("valid message");

    let effects = classify_and_admit(&mut coord, ClientId(1), &msg);
    assert!(matches!(effects.last(), Some(Effect::Close(ClientId(1)))));
    assert_eq!(coord.registry.len(), 1);
}

#[test]
fn new_worker_joining_after_suspend_broadcast_is_told_to_suspend_immediately() {
    let mut coord = Coordinator::new(test_options(), FakeClock::new());
    let first = UniqueProcessId::new(1, 100, 1_700_000_000, 0);
    classify_and_admit(&mut coord, ClientId(0), &hello_msg(first, WorkerState::Unknown, hello_payload("hostA", "prog", None)));
    coord.workers_running_and_suspend_msg_sent = true;

    let forked = UniqueProcessId::new(1, 101, 1_700_000_000, 1);
    let msg = hello_msg(forked, WorkerState::Unknown, hello_payload("hostA", "prog", None));
    let effects = classify_and_admit(&mut coord, ClientId(1), &msg);

    assert_eq!(coord.registry.len(), 2);
    assert!(effects.iter().any(|e| matches!(e, Effect::Send(ClientId(1), msg) if msg.record.msg_type == MessageType::DoSuspend)));
}

#[test]
fn restart_bootstrap_establishes_the_computation_on_first_applicant() {
    let mut coord = Coordinator::new(test_options(), FakeClock::new());
    let applicant = UniqueProcessId::new(3, 300, 1_700_000_002, 0);
    let mut record = ControlRecord::new(MessageType::RestartProcess, applicant, WorkerState::Restarting);
    record.comp_group = applicant;
    record.num_peers = 2;
    let msg = Message::new(record, Vec::new()).expect("valid message");

    let effects = classify_and_admit(&mut coord, ClientId(0), &msg);

    assert_eq!(coord.computation_id, ComputationId(applicant));
    assert!(coord.is_restarting);
    assert_eq!(coord.num_peers, 2);
    assert!(matches!(effects[0], Effect::Send(ClientId(0), _)));
}

#[test]
fn restart_bootstrap_rejects_an_applicant_from_a_different_computation() {
    let mut coord = Coordinator::new(test_options(), FakeClock::new());
    let applicant = UniqueProcessId::new(3, 300, 1_700_000_002, 0);
    let mut record = ControlRecord::new(MessageType::RestartProcess, applicant, WorkerState::Restarting);
    record.comp_group = applicant;
    record.num_peers = 2;
    classify_and_admit(&mut coord, ClientId(0), &Message::new(record, Vec::new()).expect("valid message"));

    let foreign = UniqueProcessId::new(4, 400, 1_700_000_003, 0);
    let mut record2 = ControlRecord::new(MessageType::RestartProcess, foreign, WorkerState::Restarting);
    record2.comp_group = foreign;
    record2.num_peers = 2;
    let effects = classify_and_admit(&mut coord, ClientId(1), &Message::new(record2, Vec::new()).expect("valid message"));

    assert!(matches!(effects.last(), Some(Effect::Close(ClientId(1)))));
}

#[test]
fn kill_in_progress_closes_every_new_connection() {
    let mut coord = Coordinator::new(test_options(), FakeClock::new());
    coord.kill_in_progress = true;
    let record = ControlRecord::new(MessageType::GetVirtualPid, UniqueProcessId::SENTINEL, WorkerState::Unknown);
    let msg = Message::new(record, Vec::new()).expect("valid message");
    let effects = classify_and_admit(&mut coord, ClientId(0), &msg);
    assert!(matches!(effects.last(), Some(Effect::Close(ClientId(0)))));
}
