// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single-threaded, cooperative event loop. One task owns every client
//! socket; nothing here ever spawns a task per connection. Each socket's
//! read and write halves are split so a pending read (sitting in
//! `pending_reads`) never blocks a broadcast or reply from going out on the
//! same connection. SIGINT takes the same graceful-shutdown path as the
//! operator's `q` command.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use dmtcp_core::{Clock, MessageType};
use dmtcp_wire::{Message, ProtocolError};
use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use crate::client::ClientId;
use crate::coordinator::Coordinator;
use crate::effect::Effect;
use crate::error::CoordinatorError;
use crate::options::Options;
use crate::{admission, commands, phase};

type ReadOutcome = (ClientId, OwnedReadHalf, Result<Message, ProtocolError>);

pub struct EventLoop<C: Clock> {
    coord: Coordinator<C>,
    listener: TcpListener,
    write_halves: HashMap<ClientId, OwnedWriteHalf>,
    pending_reads: FuturesUnordered<Pin<Box<dyn Future<Output = ReadOutcome> + Send>>>,
}

impl<C: Clock> EventLoop<C> {
    /// Binds the listening socket and constructs the coordinator state.
    /// `options.port` is updated to the bound port (relevant when 0 was
    /// requested, e.g. in tests).
    ///
    /// Does not attempt to adopt an already-open listener handed down by a
    /// parent process: doing so needs taking ownership of a raw descriptor,
    /// which has no safe std API and this workspace forbids `unsafe_code`.
    pub async fn bind(mut options: Options, clock: C) -> Result<Self, CoordinatorError> {
        let listener = TcpListener::bind(("0.0.0.0", options.port))
            .await
            .map_err(|source| CoordinatorError::BindFailed { port: options.port, source })?;
        options.port = listener.local_addr().map(|addr| addr.port()).unwrap_or(options.port);

        Ok(Self {
            coord: Coordinator::new(options, clock),
            listener,
            write_halves: HashMap::new(),
            pending_reads: FuturesUnordered::new(),
        })
    }

    pub fn bound_port(&self) -> u16 {
        self.coord.options.port
    }

    /// Runs until an `Effect::Exit` fires, returning its code.
    pub async fn run(mut self) -> i32 {
        let read_stdin = !self.coord.options.background && !self.coord.options.batch;
        let mut stdin_lines: Option<Lines<BufReader<Stdin>>> =
            read_stdin.then(|| BufReader::new(tokio::io::stdin()).lines());

        let mut ticker = (self.coord.checkpoint_interval_seconds > 0).then(|| {
            let mut interval =
                tokio::time::interval(Duration::from_secs(self.coord.checkpoint_interval_seconds as u64));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            interval
        });

        loop {
            tokio::select! {
                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, _addr)) => self.admit_new_connection(stream),
                        Err(err) => warn!(%err, "accept failed"),
                    }
                }

                Some((client_id, read_half, result)) = self.pending_reads.next(),
                    if !self.pending_reads.is_empty() =>
                {
                    if let Some(code) = self.handle_read(client_id, read_half, result).await {
                        return code;
                    }
                }

                line = next_stdin_line(&mut stdin_lines), if stdin_lines.is_some() => {
                    match line {
                        Some(text) => {
                            if let Some(ch) = text.chars().find(|c| !c.is_whitespace()) {
                                let effects = commands::handle_stdin_command(&mut self.coord, ch);
                                if let Some(code) = self.apply_effects(effects).await {
                                    return code;
                                }
                            }
                        }
                        None => stdin_lines = None,
                    }
                }

                _ = tick_checkpoint_timer(&mut ticker), if ticker.is_some() => {
                    // The same periodic timer backs two duties, matching the
                    // original's single-timeout design: outside a restart it
                    // drives periodic checkpoints; during one it is the
                    // restart-bootstrap timeout, which only warns (liveness
                    // stays the operator's job, per SPEC_FULL §5).
                    let effects = if self.coord.is_restarting {
                        warn!("restart bootstrap still waiting on peers to reconnect");
                        Vec::new()
                    } else {
                        commands::maybe_start_periodic_checkpoint(&mut self.coord)
                    };
                    if let Some(code) = self.apply_effects(effects).await {
                        return code;
                    }
                }

                sigint = tokio::signal::ctrl_c() => {
                    if let Err(err) = sigint {
                        warn!(%err, "failed to install SIGINT handler");
                    }
                    info!("SIGINT received, shutting down");
                    let effects = commands::handle_stdin_command(&mut self.coord, 'q');
                    if let Some(code) = self.apply_effects(effects).await {
                        return code;
                    }
                }
            }
        }
    }

    fn admit_new_connection(&mut self, stream: TcpStream) {
        if let Err(err) = stream.set_nodelay(true) {
            warn!(%err, "failed to set TCP_NODELAY on accepted socket");
        }
        let client_id = self.coord.next_client_id();
        let (read_half, write_half) = stream.into_split();
        self.write_halves.insert(client_id, write_half);
        self.push_read(client_id, read_half);
    }

    fn push_read(&mut self, client_id: ClientId, mut read_half: OwnedReadHalf) {
        let fut = async move {
            let result = dmtcp_wire::read_message(&mut read_half).await;
            (client_id, read_half, result)
        };
        self.pending_reads.push(Box::pin(fut));
    }

    async fn handle_read(
        &mut self,
        client_id: ClientId,
        read_half: OwnedReadHalf,
        result: Result<Message, ProtocolError>,
    ) -> Option<i32> {
        let msg = match result {
            Ok(msg) => msg,
            Err(err) => {
                warn!(?client_id, %err, "client read failed, closing connection");
                return self.close(client_id);
            }
        };

        let effects = self.dispatch(client_id, &msg);
        if let Some(code) = self.apply_effects(effects).await {
            return Some(code);
        }

        if self.write_halves.contains_key(&client_id) {
            self.push_read(client_id, read_half);
        }
        None
    }

    fn dispatch(&mut self, client_id: ClientId, msg: &Message) -> Vec<Effect> {
        if self.coord.registry.get(client_id).is_some() {
            if msg.record.msg_type == MessageType::UserCmd {
                commands::handle_user_cmd(&mut self.coord, client_id, msg)
            } else {
                phase::handle_client_message(&mut self.coord, client_id, msg)
            }
        } else {
            admission::classify_and_admit(&mut self.coord, client_id, msg)
        }
    }

    async fn apply_effects(&mut self, effects: Vec<Effect>) -> Option<i32> {
        for effect in effects {
            match effect {
                Effect::Send(client_id, msg) => self.send(client_id, msg).await,
                Effect::Broadcast(msg) => self.broadcast(msg).await,
                Effect::Close(client_id) => {
                    if let Some(code) = self.close(client_id) {
                        return Some(code);
                    }
                }
                Effect::Exit(code) => {
                    info!(code, "coordinator exiting");
                    return Some(code);
                }
            }
        }
        None
    }

    async fn send(&mut self, client_id: ClientId, msg: Message) {
        let Some(write_half) = self.write_halves.get_mut(&client_id) else {
            return;
        };
        if let Err(err) = dmtcp_wire::write_message(write_half, &msg).await {
            warn!(?client_id, %err, "write failed, closing connection");
            self.close(client_id);
        }
    }

    async fn broadcast(&mut self, msg: Message) {
        let ids: Vec<ClientId> = self.write_halves.keys().copied().collect();
        for id in ids {
            self.send(id, msg.clone()).await;
        }
    }

    /// Drops the write half (which also ends the read half once its pending
    /// read future completes) and folds the departure into coordinator state.
    fn close(&mut self, client_id: ClientId) -> Option<i32> {
        self.write_halves.remove(&client_id);
        match self.coord.on_client_removed(client_id) {
            Some(Effect::Exit(code)) => Some(code),
            _ => None,
        }
    }
}

async fn next_stdin_line(lines: &mut Option<Lines<BufReader<Stdin>>>) -> Option<String> {
    match lines {
        Some(lines) => match lines.next_line().await {
            Ok(line) => line,
            Err(err) => {
                warn!(%err, "stdin read failed");
                None
            }
        },
        None => std::future::pending().await,
    }
}

async fn tick_checkpoint_timer(ticker: &mut Option<tokio::time::Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
