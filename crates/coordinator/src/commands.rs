// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator command dispatch. The same characters arrive two ways: framed
//! inside a `DMT_USER_CMD` message on a one-shot connection (which gets a
//! reply), or as raw bytes on stdin (which does not).
//!
//! `s`'s status reply repurposes the record's `virtual_pid` field as a 0/1
//! flag for "running and unanimous", since the protocol has no dedicated
//! status field for this reimplementation to draw on (see DESIGN.md).

use dmtcp_core::{Clock, WorkerState};
use dmtcp_wire::{ControlRecord, Message, ERROR_INVALID_COMMAND, ERROR_NOT_RUNNING_STATE, NOERROR};
use tracing::info;

use crate::client::ClientId;
use crate::coordinator::{Coordinator, PendingReplyKind};
use crate::effect::Effect;

/// Replies and closes the one-shot connection, the ordinary case for every
/// operator command except `b`, whose connection must survive to carry the
/// blocked `c` that follows it.
fn ack(client_id: ClientId, error_code: u32, num_peers: u32, virtual_pid: u32, checkpoint_interval: u32) -> Vec<Effect> {
    let mut effects = ack_keep_open(client_id, error_code, num_peers, virtual_pid, checkpoint_interval);
    effects.push(Effect::Close(client_id));
    effects
}

fn ack_keep_open(
    client_id: ClientId,
    error_code: u32,
    num_peers: u32,
    virtual_pid: u32,
    checkpoint_interval: u32,
) -> Vec<Effect> {
    let mut record =
        ControlRecord::new(dmtcp_core::MessageType::UserCmdResult, dmtcp_core::UniqueProcessId::SENTINEL, WorkerState::Unknown);
    record.coord_error_code = error_code;
    record.num_peers = num_peers;
    record.virtual_pid = virtual_pid;
    record.checkpoint_interval = checkpoint_interval;
    match Message::new(record, Vec::new()) {
        Ok(reply) => vec![Effect::Send(client_id, reply)],
        Err(_) => vec![Effect::Close(client_id)],
    }
}

fn broadcast(msg_type: dmtcp_core::MessageType) -> Effect {
    let record = ControlRecord::new(msg_type, dmtcp_core::UniqueProcessId::SENTINEL, WorkerState::Unknown);
    // A freshly-built record with no payload always has extra_bytes == 0,
    // so constructing the message directly can never hit the length check.
    Effect::Broadcast(Message { record, payload: Vec::new() })
}

/// Handles one `DMT_USER_CMD` message; the originating socket is the reply target.
pub fn handle_user_cmd<C: Clock>(coord: &mut Coordinator<C>, client_id: ClientId, msg: &Message) -> Vec<Effect> {
    let cmd = (msg.record.coord_cmd as char).to_ascii_lowercase();
    dispatch(coord, cmd, msg.record.checkpoint_interval, Some(client_id))
}

/// Handles one operator keystroke from stdin; there is no reply target.
pub fn handle_stdin_command<C: Clock>(coord: &mut Coordinator<C>, ch: char) -> Vec<Effect> {
    dispatch(coord, ch.to_ascii_lowercase(), 0, None)
}

fn dispatch<C: Clock>(
    coord: &mut Coordinator<C>,
    cmd: char,
    interval_field: u32,
    reply_to: Option<ClientId>,
) -> Vec<Effect> {
    match cmd {
        'l' | 't' => {
            for client in coord.registry.iter() {
                info!(
                    client_number = client.client_number,
                    program = %client.program,
                    pid = client.identity.pid,
                    host = %client.hostname,
                    identity = %client.identity,
                    state = %client.state,
                    "client"
                );
            }
            reply_to.map(|id| ack(id, NOERROR, coord.registry.len() as u32, 0, 0)).unwrap_or_default()
        }
        's' => {
            let running_and_unanimous =
                coord.registry.min_state() == WorkerState::Running && coord.registry.unanimous();
            reply_to
                .map(|id| ack(id, NOERROR, coord.registry.len() as u32, running_and_unanimous as u32, 0))
                .unwrap_or_default()
        }
        'i' => {
            if interval_field > 0 {
                coord.checkpoint_interval_seconds = interval_field;
                coord.default_checkpoint_interval_seconds = interval_field;
            }
            reply_to.map(|id| ack(id, NOERROR, 0, 0, coord.checkpoint_interval_seconds)).unwrap_or_default()
        }
        'c' => start_checkpoint(coord, reply_to),
        'b' => {
            coord.blocking_next_checkpoint = true;
            reply_to.map(|id| ack_keep_open(id, NOERROR, 0, 0, 0)).unwrap_or_default()
        }
        'k' => {
            coord.kill_in_progress = true;
            let mut effects = vec![broadcast(dmtcp_core::MessageType::KillPeer)];
            effects.extend(reply_to.map(|id| ack(id, NOERROR, 0, 0, 0)).unwrap_or_default());
            effects
        }
        'q' => {
            let mut effects = vec![broadcast(dmtcp_core::MessageType::KillPeer)];
            for client in coord.registry.iter() {
                effects.push(Effect::Close(client.client_id));
            }
            if let Some(id) = reply_to {
                effects.push(Effect::Close(id));
            }
            effects.push(Effect::Exit(0));
            effects
        }
        'f' => {
            let mut effects = vec![broadcast(dmtcp_core::MessageType::ForceRestart)];
            effects.extend(reply_to.map(|id| ack(id, NOERROR, 0, 0, 0)).unwrap_or_default());
            effects
        }
        'h' | '?' => {
            info!("{}", HELP_TEXT);
            reply_to.map(|id| ack(id, NOERROR, 0, 0, 0)).unwrap_or_default()
        }
        c if c.is_whitespace() => Vec::new(),
        _ => reply_to.map(|id| ack(id, ERROR_INVALID_COMMAND, 0, 0, 0)).unwrap_or_default(),
    }
}

/// Invoked by the event loop's periodic-checkpoint timer. A no-op (not an
/// error) when the coordinator is not currently eligible to start one.
pub fn maybe_start_periodic_checkpoint<C: Clock>(coord: &mut Coordinator<C>) -> Vec<Effect> {
    let eligible = coord.registry.min_state() == WorkerState::Running
        && coord.registry.unanimous()
        && !coord.workers_running_and_suspend_msg_sent
        && !coord.registry.is_empty();
    if !eligible {
        return Vec::new();
    }
    start_checkpoint(coord, None)
}

fn start_checkpoint<C: Clock>(coord: &mut Coordinator<C>, reply_to: Option<ClientId>) -> Vec<Effect> {
    let eligible = coord.registry.min_state() == WorkerState::Running
        && coord.registry.unanimous()
        && !coord.workers_running_and_suspend_msg_sent;

    if !eligible {
        return reply_to.map(|id| ack(id, ERROR_NOT_RUNNING_STATE, 0, 0, 0)).unwrap_or_default();
    }

    let num_peers = coord.registry.len() as u32;
    coord.restart_filenames.clear();
    coord.workers_running_and_suspend_msg_sent = true;

    let mut effects = vec![broadcast(dmtcp_core::MessageType::DoSuspend)];

    if coord.blocking_next_checkpoint {
        coord.blocking_next_checkpoint = false;
        if let Some(id) = reply_to {
            coord.pending_reply = Some((id, PendingReplyKind::CheckpointComplete));
        }
        // Deliberately no ack/close here: the reply is deferred until DMT_DO_RESUME.
    } else {
        effects.extend(reply_to.map(|id| ack(id, NOERROR, num_peers, 0, 0)).unwrap_or_default());
    }

    effects
}

const HELP_TEXT: &str = "\
Commands:
  l,t  list connected clients
  s    status
  i    get/set checkpoint interval
  c    checkpoint now
  b    mark next checkpoint as blocking
  k    kill all peers
  q    kill all peers and exit
  f    force restart
  h,?  this help";

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
