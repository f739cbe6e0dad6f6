use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use stardewl_core::{ClientId, SignalType};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::command::{OutboundTx, RoomCommand, SweepOutcome};
use super::error::JoinError;

const BINDING_IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const ROOM_EMPTY_EXPIRY: Duration = Duration::from_secs(30 * 60);
const REPLAY_INTER_FRAME_DELAY: Duration = Duration::from_millis(50);

struct Binding {
    outbound: OutboundTx,
    is_host: bool,
    last_seen: Instant,
}

/// Owns all state for a single room. Reached exclusively through its command
/// channel — the actor mailbox is the room's lock, there is no shared mutex.
pub struct Room {
    cmd_rx: mpsc::Receiver<RoomCommand>,
    bindings: HashMap<ClientId, Binding>,
    host: Option<ClientId>,
    pending: Vec<SignalType>,
    created_at: Instant,
    /// Shared across every room actor so `GET /health` can report total live
    /// bindings (`SPEC_FULL.md` §4.1) without polling each actor in turn.
    connections: Arc<AtomicUsize>,
}

impl Room {
    pub fn new(cmd_rx: mpsc::Receiver<RoomCommand>, connections: Arc<AtomicUsize>) -> Self {
        Self {
            cmd_rx,
            bindings: HashMap::new(),
            host: None,
            pending: Vec::new(),
            created_at: Instant::now(),
            connections,
        }
    }

    pub async fn run(mut self, room_code: String) {
        while let Some(cmd) = self.cmd_rx.recv().await {
            match cmd {
                RoomCommand::Join { client_id, is_host, outbound, reply } => {
                    self.handle_join(client_id, is_host, outbound, reply).await;
                }
                RoomCommand::Frame { client_id, envelope } => {
                    self.handle_frame(client_id, envelope);
                }
                RoomCommand::Leave { client_id } => {
                    self.handle_leave(client_id);
                }
                RoomCommand::Sweep { reply } => {
                    let outcome = self.handle_sweep();
                    let _ = reply.send(outcome);
                }
                RoomCommand::HasHost { reply } => {
                    let _ = reply.send(self.host.is_some());
                }
            }
        }
        debug!(room = %room_code, "room actor shut down");
    }

    async fn handle_join(
        &mut self,
        client_id: ClientId,
        is_host: bool,
        outbound: OutboundTx,
        reply: oneshot::Sender<Result<(), JoinError>>,
    ) {
        if is_host && self.host.is_some() {
            let _ = reply.send(Err(JoinError::HostSlotTaken));
            return;
        }

        if is_host {
            self.host = Some(client_id.clone());
        } else if let Some(host_binding) = self.host.as_ref().and_then(|h| self.bindings.get(h)) {
            let _ = host_binding
                .outbound
                .send(SignalType::ClientConnected { client_id: client_id.to_string() });
        }

        self.bindings
            .insert(client_id.clone(), Binding { outbound: outbound.clone(), is_host, last_seen: Instant::now() });
        self.connections.fetch_add(1, Ordering::Relaxed);
        let _ = reply.send(Ok(()));
        let _ = outbound.send(SignalType::Connected);

        if !is_host {
            for msg in self.pending.clone() {
                if outbound.send(msg).is_err() {
                    break;
                }
                tokio::time::sleep(REPLAY_INTER_FRAME_DELAY).await;
            }
        }
        info!(%client_id, is_host, "binding joined");
    }

    fn handle_frame(&mut self, client_id: ClientId, envelope: SignalType) {
        let is_host = match self.bindings.get_mut(&client_id) {
            Some(binding) => {
                binding.last_seen = Instant::now();
                binding.is_host
            }
            None => return,
        };

        match envelope {
            SignalType::Ping => {
                if let Some(b) = self.bindings.get(&client_id) {
                    let _ = b.outbound.send(SignalType::Pong);
                }
            }
            SignalType::Offer { .. } if is_host => {
                self.pending.push(envelope.clone());
                self.broadcast_to_joiners(envelope, &client_id);
            }
            SignalType::IceCandidate { .. } if is_host => {
                self.pending.push(envelope.clone());
                self.broadcast_to_joiners(envelope, &client_id);
            }
            SignalType::Answer { .. } if !is_host => {
                self.forward_to_host(envelope);
            }
            SignalType::IceCandidate { .. } if !is_host => {
                self.forward_to_host(envelope);
            }
            other => {
                warn!(%client_id, is_host, envelope = ?other, "dropping unexpected envelope for role");
            }
        }
    }

    fn broadcast_to_joiners(&self, envelope: SignalType, sender: &ClientId) {
        for (id, binding) in &self.bindings {
            if id != sender && !binding.is_host {
                let _ = binding.outbound.send(envelope.clone());
            }
        }
    }

    fn forward_to_host(&self, envelope: SignalType) {
        if let Some(host_binding) = self.host.as_ref().and_then(|h| self.bindings.get(h)) {
            let _ = host_binding.outbound.send(envelope);
        }
    }

    fn handle_leave(&mut self, client_id: ClientId) {
        let Some(binding) = self.bindings.remove(&client_id) else { return };
        self.connections.fetch_sub(1, Ordering::Relaxed);

        if binding.is_host {
            self.host = None;
            self.pending.clear();
            for joiner in self.bindings.values().filter(|b| !b.is_host) {
                let _ = joiner.outbound.send(SignalType::HostDisconnected);
            }
        } else if let Some(host_binding) = self.host.as_ref().and_then(|h| self.bindings.get(h)) {
            let _ = host_binding
                .outbound
                .send(SignalType::ClientDisconnected { client_id: client_id.to_string() });
        }
        info!(%client_id, was_host = binding.is_host, "binding left");
    }

    fn handle_sweep(&mut self) -> SweepOutcome {
        let now = Instant::now();
        let idle: Vec<ClientId> = self
            .bindings
            .iter()
            .filter(|(_, b)| now.duration_since(b.last_seen) > BINDING_IDLE_TIMEOUT)
            .map(|(id, _)| id.clone())
            .collect();

        for id in idle {
            warn!(client_id = %id, "evicting idle binding");
            self.handle_leave(id);
        }

        if self.bindings.is_empty() && now.duration_since(self.created_at) > ROOM_EMPTY_EXPIRY {
            SweepOutcome::ExpiredEmpty
        } else {
            SweepOutcome::Alive
        }
    }
}
