// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn declared_order_matches_barrier_order() {
    let ordered = WorkerState::ALL;
    for pair in ordered.windows(2) {
        assert!(pair[0] < pair[1], "{:?} should sort before {:?}", pair[0], pair[1]);
    }
}

#[yare::parameterized(
    unknown = { WorkerState::Unknown, 0 },
    running = { WorkerState::Running, 1 },
    suspended = { WorkerState::Suspended, 2 },
    fd_leader_election = { WorkerState::FdLeaderElection, 3 },
    drained = { WorkerState::Drained, 4 },
    restarting = { WorkerState::Restarting, 5 },
    checkpointed = { WorkerState::Checkpointed, 6 },
    name_service_data_registered = { WorkerState::NameServiceDataRegistered, 7 },
    done_querying = { WorkerState::DoneQuerying, 8 },
    refilled = { WorkerState::Refilled, 9 },
)]
fn wire_values_are_fixed(state: WorkerState, expected: u32) {
    assert_eq!(state.wire_value(), expected);
    assert_eq!(WorkerState::from_wire_value(expected), Some(state));
}

#[test]
fn unknown_wire_value_rejected() {
    assert_eq!(WorkerState::from_wire_value(255), None);
}

#[test]
fn min_and_max_across_a_set() {
    let states = [WorkerState::Running, WorkerState::Suspended, WorkerState::Drained];
    assert_eq!(states.iter().copied().min(), Some(WorkerState::Running));
    assert_eq!(states.iter().copied().max(), Some(WorkerState::Drained));
}
