// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The phase engine: the master state machine that drives a CHECKPOINT or
//! RESTART barrier forward as `DMT_OK` messages arrive, by recomputing the
//! aggregate minimum `WorkerState` and reacting to each edge.

use dmtcp_core::{Clock, WorkerState};
use dmtcp_wire::{ControlRecord, Message};
use tracing::{info, warn};

use crate::client::ClientId;
use crate::coordinator::{Coordinator, PendingReplyKind};
use crate::effect::Effect;

fn broadcast(msg_type: dmtcp_core::MessageType, num_peers: u32) -> Effect {
    let mut record = ControlRecord::new(msg_type, dmtcp_core::UniqueProcessId::SENTINEL, WorkerState::Unknown);
    record.num_peers = num_peers;
    Effect::Broadcast(Message { record, payload: Vec::new() })
}

/// Dispatches one message from an already-admitted client.
pub fn handle_client_message<C: Clock>(coord: &mut Coordinator<C>, client_id: ClientId, msg: &Message) -> Vec<Effect> {
    use dmtcp_core::MessageType::*;
    match msg.record.msg_type {
        Ok => on_worker_ok(coord, client_id, msg.record.state),
        CkptFilename => handle_ckpt_filename(coord, msg),
        UpdateProcessInfoAfterFork => handle_update_process_info_after_fork(coord, client_id, msg),
        RegisterNameServiceData => handle_register_name_service_data(coord, msg),
        NameServiceQuery => handle_name_service_query(coord, client_id, msg),
        _ => vec![Effect::Close(client_id)],
    }
}

/// The effective minimum state for edge-detection, folding in the two
/// special cases from the spec: a partially-resumed computation still
/// reads as REFILLED, and a still-reconnecting restart still reads as
/// RESTARTING even once every connected peer reports CHECKPOINTED.
fn effective_min_state<C: Clock>(coord: &Coordinator<C>) -> WorkerState {
    let min_state = coord.registry.min_state();
    let max_state = coord.registry.max_state();
    if min_state == WorkerState::Running && !coord.registry.unanimous() && max_state == WorkerState::Refilled {
        return WorkerState::Refilled;
    }
    if coord.is_restarting
        && min_state == WorkerState::Checkpointed
        && (coord.registry.len() as u32) < coord.num_peers
    {
        return WorkerState::Restarting;
    }
    min_state
}

pub fn on_worker_ok<C: Clock>(coord: &mut Coordinator<C>, client_id: ClientId, reported_state: WorkerState) -> Vec<Effect> {
    let last_state = match coord.registry.get(client_id) {
        Some(client) => client.state,
        None => return vec![Effect::Close(client_id)],
    };

    // REFILLED -> RUNNING is the DMT_DO_RESUME reply resetting a peer for the
    // next cycle, not a regression: every other decrease is a true mid-barrier
    // regression and still gets rejected.
    let is_resume_reset = last_state == WorkerState::Refilled && reported_state == WorkerState::Running;
    if reported_state < last_state && !is_resume_reset {
        warn!(?client_id, reported = %reported_state, last = %last_state, "non-monotonic DMT_OK, closing client");
        return vec![Effect::Close(client_id)];
    }

    let old_min = effective_min_state(coord);
    if let Some(client) = coord.registry.get_mut(client_id) {
        client.state = reported_state;
    }
    let new_min = effective_min_state(coord);

    if old_min == new_min {
        return Vec::new();
    }

    let num_peers = coord.registry.len() as u32;
    info!(old = %old_min, new = %new_min, "phase edge");

    match (old_min, new_min) {
        (WorkerState::Running, WorkerState::Suspended) => {
            coord.workers_running_and_suspend_msg_sent = false;
            coord.computation_id.increment_generation();
            vec![broadcast(dmtcp_core::MessageType::DoFdLeaderElection, num_peers)]
        }
        (WorkerState::Suspended, WorkerState::FdLeaderElection) => {
            vec![broadcast(dmtcp_core::MessageType::DoDrain, num_peers)]
        }
        (WorkerState::FdLeaderElection, WorkerState::Drained) => {
            vec![broadcast(dmtcp_core::MessageType::DoCheckpoint, num_peers)]
        }
        (WorkerState::Drained, WorkerState::Checkpointed) => {
            if let Err(err) = crate::restart_script::write(coord) {
                tracing::error!(%err, "failed to write restart script");
            }
            coord.lookup.reset();
            vec![broadcast(dmtcp_core::MessageType::DoRegisterNameServiceData, num_peers)]
        }
        (WorkerState::Restarting, WorkerState::Checkpointed) => {
            coord.is_restarting = false;
            coord.lookup.reset();
            vec![broadcast(dmtcp_core::MessageType::DoRegisterNameServiceData, num_peers)]
        }
        (WorkerState::Checkpointed, WorkerState::NameServiceDataRegistered) => {
            vec![broadcast(dmtcp_core::MessageType::DoSendQueries, num_peers)]
        }
        (WorkerState::NameServiceDataRegistered, WorkerState::DoneQuerying) => {
            vec![broadcast(dmtcp_core::MessageType::DoRefill, num_peers)]
        }
        (WorkerState::DoneQuerying, WorkerState::Refilled) => {
            coord.is_restarting = false;
            let mut effects = vec![broadcast(dmtcp_core::MessageType::DoResume, num_peers)];
            if let Some((pending_id, PendingReplyKind::CheckpointComplete)) = coord.pending_reply.take() {
                let record = ControlRecord::new(
                    dmtcp_core::MessageType::UserCmdResult,
                    dmtcp_core::UniqueProcessId::SENTINEL,
                    WorkerState::Unknown,
                );
                effects.push(Effect::Send(pending_id, Message { record, payload: Vec::new() }));
                effects.push(Effect::Close(pending_id));
            }
            effects
        }
        _ => Vec::new(),
    }
}

fn handle_ckpt_filename<C: Clock>(coord: &mut Coordinator<C>, msg: &Message) -> Vec<Effect> {
    if let Some((filename, hostname)) = msg.ckpt_filename_and_hostname() {
        coord.restart_filenames.entry(hostname.to_string()).or_default().push(filename.to_string());
    }
    Vec::new()
}

fn handle_update_process_info_after_fork<C: Clock>(
    coord: &mut Coordinator<C>,
    client_id: ClientId,
    msg: &Message,
) -> Vec<Effect> {
    if let Some(client) = coord.registry.get_mut(client_id) {
        client.identity = msg.record.sender;
        let mut parts = msg.payload.split(|&b| b == 0).map(|s| String::from_utf8_lossy(s).into_owned());
        if let Some(hostname) = parts.next() {
            client.hostname = hostname;
        }
        if let Some(program) = parts.next() {
            client.program = program;
        }
    }
    Vec::new()
}

fn handle_register_name_service_data<C: Clock>(coord: &mut Coordinator<C>, msg: &Message) -> Vec<Effect> {
    if let Some((key, value)) = msg.key_value() {
        if coord.lookup.register(key, value) {
            warn!("duplicate lookup-service key registered");
        }
    }
    Vec::new()
}

fn handle_name_service_query<C: Clock>(coord: &mut Coordinator<C>, client_id: ClientId, msg: &Message) -> Vec<Effect> {
    let key_len = msg.record.key_len as usize;
    let key = if msg.payload.len() >= key_len { &msg.payload[..key_len] } else { &msg.payload[..] };
    match coord.lookup.query(key) {
        Some(value) => {
            let mut record = ControlRecord::new(
                dmtcp_core::MessageType::NameServiceQueryResponse,
                dmtcp_core::UniqueProcessId::SENTINEL,
                WorkerState::Unknown,
            );
            record.key_len = key.len() as u32;
            record.val_len = value.len() as u32;
            let mut payload = key.to_vec();
            payload.extend_from_slice(value);
            record.extra_bytes = payload.len() as u32;
            match Message::new(record, payload) {
                Ok(reply) => vec![Effect::Send(client_id, reply)],
                Err(_) => vec![Effect::Close(client_id)],
            }
        }
        None => {
            tracing::error!("name-service query for unregistered key");
            vec![Effect::Close(client_id)]
        }
    }
}

#[cfg(test)]
#[path = "phase_tests.rs"]
mod tests;
