// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Classifies the first message on every accepted connection and decides
//! whether to admit it into the client registry, reject it, or serve it as
//! a one-shot request.
//!
//! The hello/restart payload convention (`hostname\0progname\0prefixdir\0`,
//! prefixdir empty when absent) mirrors `readProcessInfo()`'s offset
//! arithmetic over hostname/progname/prefixDir (see DESIGN.md).

use dmtcp_core::{Clock, ComputationId, UniqueProcessId, WorkerState};
use dmtcp_wire::{ControlRecord, Message};

use crate::client::ClientId;
use crate::coordinator::Coordinator;
use crate::effect::Effect;

fn parse_hello_payload(payload: &[u8]) -> (String, String, Option<String>) {
    let mut parts = payload.split(|&b| b == 0).map(|s| String::from_utf8_lossy(s).into_owned());
    let hostname = parts.next().unwrap_or_default();
    let program = parts.next().unwrap_or_default();
    let prefix_dir = parts.next().filter(|s| !s.is_empty());
    (hostname, program, prefix_dir)
}

fn kill_and_close(client_id: ClientId) -> Vec<Effect> {
    let reply = Message::new(
        ControlRecord::new(dmtcp_core::MessageType::KillPeer, UniqueProcessId::SENTINEL, WorkerState::Unknown),
        Vec::new(),
    );
    let mut effects = Vec::new();
    if let Ok(reply) = reply {
        effects.push(Effect::Send(client_id, reply));
    }
    effects.push(Effect::Close(client_id));
    effects
}

fn reject(client_id: ClientId, error_code: u32) -> Vec<Effect> {
    let mut record = ControlRecord::new(dmtcp_core::MessageType::Reject, UniqueProcessId::SENTINEL, WorkerState::Unknown);
    record.coord_error_code = error_code;
    let reply = Message::new(record, Vec::new());
    let mut effects = Vec::new();
    if let Ok(reply) = reply {
        effects.push(Effect::Send(client_id, reply));
    }
    effects.push(Effect::Close(client_id));
    effects
}

/// Dispatches the single framed message read from a freshly accepted
/// connection. Returns the effects (replies, closes) the event loop must
/// carry out; the client is left registered only when admission succeeds.
pub fn classify_and_admit<C: Clock>(
    coord: &mut Coordinator<C>,
    client_id: ClientId,
    msg: &Message,
) -> Vec<Effect> {
    use dmtcp_core::MessageType::*;

    if coord.kill_in_progress {
        return kill_and_close(client_id);
    }

    match msg.record.msg_type {
        GetVirtualPid => handle_get_virtual_pid(coord, client_id),
        UserCmd => crate::commands::handle_user_cmd(coord, client_id, msg),
        RestartProcess => handle_restart_bootstrap(coord, client_id, msg),
        HelloCoordinator if msg.record.state == WorkerState::Restarting => {
            handle_hello_restarting(coord, client_id, msg)
        }
        HelloCoordinator
            if matches!(msg.record.state, WorkerState::Running | WorkerState::Unknown) =>
        {
            handle_hello_new_worker(coord, client_id, msg)
        }
        _ => vec![Effect::Close(client_id)],
    }
}

fn handle_get_virtual_pid<C: Clock>(coord: &mut Coordinator<C>, client_id: ClientId) -> Vec<Effect> {
    let live = coord.registry.live_virtual_pids();
    match coord.vpid.alloc(&live) {
        Ok(vpid) => {
            let mut record = ControlRecord::new(
                dmtcp_core::MessageType::GetVirtualPidResult,
                UniqueProcessId::SENTINEL,
                WorkerState::Unknown,
            );
            record.virtual_pid = vpid;
            match Message::new(record, Vec::new()) {
                Ok(reply) => vec![Effect::Send(client_id, reply), Effect::Close(client_id)],
                Err(_) => vec![Effect::Close(client_id)],
            }
        }
        Err(_) => vec![Effect::Close(client_id)],
    }
}

fn handle_restart_bootstrap<C: Clock>(
    coord: &mut Coordinator<C>,
    client_id: ClientId,
    msg: &Message,
) -> Vec<Effect> {
    let applicant_comp = ComputationId(msg.record.comp_group);
    let num_peers = msg.record.num_peers;

    let accepted = if coord.computation_id.is_sentinel() {
        coord.computation_id = applicant_comp;
        coord.num_peers = num_peers;
        coord.coord_timestamp = coord.clock.coord_timestamp();
        coord.is_restarting = true;
        true
    } else {
        coord.computation_id == applicant_comp && coord.num_peers == num_peers
    };

    if !accepted {
        return reject(client_id, dmtcp_wire::ERROR_NOT_RUNNING_STATE);
    }

    let live = coord.registry.live_virtual_pids();
    let vpid = match coord.vpid.alloc(&live) {
        Ok(vpid) => vpid,
        Err(_) => return vec![Effect::Close(client_id)],
    };
    coord.registry.insert(
        client_id,
        msg.record.sender,
        vpid,
        String::new(),
        String::new(),
        None,
        WorkerState::Restarting,
    );

    let mut record = ControlRecord::new(
        dmtcp_core::MessageType::RestartProcessReply,
        UniqueProcessId::SENTINEL,
        WorkerState::Unknown,
    );
    record.comp_group = coord.computation_id.0;
    record.coord_timestamp = coord.coord_timestamp;
    record.virtual_pid = vpid;
    match Message::new(record, Vec::new()) {
        Ok(reply) => vec![Effect::Send(client_id, reply)],
        Err(_) => vec![Effect::Close(client_id)],
    }
}

fn handle_hello_restarting<C: Clock>(
    coord: &mut Coordinator<C>,
    client_id: ClientId,
    msg: &Message,
) -> Vec<Effect> {
    let applicant_comp = ComputationId(msg.record.comp_group);
    let min_state = coord.registry.min_state();
    let in_right_phase = matches!(min_state, WorkerState::Restarting | WorkerState::Checkpointed)
        || coord.registry.is_empty();
    if applicant_comp != coord.computation_id || !in_right_phase {
        return reject(client_id, dmtcp_wire::ERROR_NOT_RUNNING_STATE);
    }
    admit_worker(coord, client_id, msg, WorkerState::Restarting)
}

fn handle_hello_new_worker<C: Clock>(
    coord: &mut Coordinator<C>,
    client_id: ClientId,
    msg: &Message,
) -> Vec<Effect> {
    let applicant_comp = ComputationId(msg.record.comp_group);

    if coord.workers_running_and_suspend_msg_sent {
        let mut effects = admit_worker(coord, client_id, msg, WorkerState::Running);
        let suspend = ControlRecord::new(
            dmtcp_core::MessageType::DoSuspend,
            UniqueProcessId::SENTINEL,
            WorkerState::Unknown,
        );
        if let Ok(suspend_msg) = Message::new(suspend, Vec::new()) {
            effects.push(Effect::Send(client_id, suspend_msg));
        }
        return effects;
    }

    let min_state = coord.registry.min_state();
    if !coord.registry.is_empty() && !matches!(min_state, WorkerState::Running | WorkerState::Unknown) {
        return reject(client_id, dmtcp_wire::ERROR_NOT_RUNNING_STATE);
    }

    if !applicant_comp.is_sentinel() {
        return reject(client_id, dmtcp_wire::ERROR_NOT_RUNNING_STATE);
    }

    let (hostname, _program, prefix_dir) = parse_hello_payload(&msg.payload);

    if coord.registry.is_empty() {
        coord.computation_id = ComputationId(msg.record.sender);
        coord.local_host_name = Some(hostname.clone());
        coord.local_prefix = prefix_dir.clone();
        coord.coord_timestamp = coord.clock.coord_timestamp();
    } else if let Some(local_host) = &coord.local_host_name {
        let same_host = *local_host == hostname;
        if same_host && prefix_dir != coord.local_prefix {
            return reject(client_id, dmtcp_wire::ERROR_NOT_RUNNING_STATE);
        }
        if !same_host {
            if let Some(remote) = &coord.remote_prefix {
                if prefix_dir.as_deref() != Some(remote.as_str()) {
                    return reject(client_id, dmtcp_wire::ERROR_NOT_RUNNING_STATE);
                }
            } else {
                coord.remote_prefix = prefix_dir.clone();
            }
        }
    }

    admit_worker(coord, client_id, msg, WorkerState::Running)
}

fn admit_worker<C: Clock>(
    coord: &mut Coordinator<C>,
    client_id: ClientId,
    msg: &Message,
    state: WorkerState,
) -> Vec<Effect> {
    let (hostname, program, prefix_dir) = parse_hello_payload(&msg.payload);
    let live = coord.registry.live_virtual_pids();
    let vpid = match coord.vpid.alloc(&live) {
        Ok(vpid) => vpid,
        Err(_) => return vec![Effect::Close(client_id)],
    };
    coord.registry.insert(client_id, msg.record.sender, vpid, hostname, program, prefix_dir, state);

    let mut record = ControlRecord::new(
        dmtcp_core::MessageType::HelloWorker,
        UniqueProcessId::SENTINEL,
        WorkerState::Unknown,
    );
    record.comp_group = coord.computation_id.0;
    record.virtual_pid = vpid;
    record.coord_timestamp = coord.coord_timestamp;
    match Message::new(record, Vec::new()) {
        Ok(reply) => vec![Effect::Send(client_id, reply)],
        Err(_) => vec![Effect::Close(client_id)],
    }
}

#[cfg(test)]
#[path = "admission_tests.rs"]
mod tests;
