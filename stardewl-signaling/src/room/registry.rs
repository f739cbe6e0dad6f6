use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use rand::Rng;
use stardewl_core::RoomCode;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::actor::Room;
use super::command::{RoomCommand, SweepOutcome};

const COMMAND_CHANNEL_CAPACITY: usize = 64;
const ROOM_CREATE_RETRIES: usize = 5;

#[derive(Clone)]
pub struct RoomHandle {
    pub tx: mpsc::Sender<RoomCommand>,
}

/// The room registry: a concurrent map from code to the actor's mailbox.
/// This is the only state shared across connections; everything else lives
/// inside a single room's actor task. `connections` is the one exception —
/// it is handed to every room actor so `GET /health` can report total live
/// bindings (`SPEC_FULL.md` §4.1) without round-tripping through every room.
#[derive(Clone, Default)]
pub struct RoomManager {
    rooms: Arc<DashMap<RoomCode, RoomHandle>>,
    connections: Arc<AtomicUsize>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh, unused 6-digit code and spawns its (empty) actor.
    pub fn create_room(&self) -> RoomCode {
        for _ in 0..ROOM_CREATE_RETRIES {
            let code = random_code();
            if self.rooms.contains_key(&code) {
                continue;
            }
            self.spawn_room(code.clone());
            return code;
        }
        let code = random_code();
        self.spawn_room(code.clone());
        code
    }

    fn spawn_room(&self, code: RoomCode) {
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        self.rooms.insert(code.clone(), RoomHandle { tx });
        let room = Room::new(rx, self.connections.clone());
        tokio::spawn(room.run(code.to_string()));
    }

    pub fn get(&self, code: &RoomCode) -> Option<RoomHandle> {
        self.rooms.get(code).map(|entry| entry.clone())
    }

    pub fn contains(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Total live WebSocket bindings across every room, the `connections`
    /// field `GET /health` reports (`SPEC_FULL.md` §4.1, `original_source`'s
    /// `signaling/main.go`: `"connections": len(connections)`).
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }

    /// Asks the room's actor whether a host binding is currently present.
    /// Returns `None` if the room does not exist or has already shut down.
    pub async fn host_present(&self, code: &RoomCode) -> Option<bool> {
        let handle = self.get(code)?;
        let (reply_tx, reply_rx) = oneshot::channel();
        handle.tx.send(RoomCommand::HasHost { reply: reply_tx }).await.ok()?;
        reply_rx.await.ok()
    }

    /// One reaper pass: ask every room to evict its idle bindings and report
    /// whether it is now empty and past the room-expiry threshold.
    pub async fn sweep(&self) {
        let codes: Vec<RoomCode> = self.rooms.iter().map(|e| e.key().clone()).collect();
        for code in codes {
            let Some(handle) = self.get(&code) else { continue };
            let (reply_tx, reply_rx) = oneshot::channel();
            if handle.tx.send(RoomCommand::Sweep { reply: reply_tx }).await.is_err() {
                self.rooms.remove(&code);
                continue;
            }
            match reply_rx.await {
                Ok(SweepOutcome::ExpiredEmpty) => {
                    self.rooms.remove(&code);
                    info!(%code, "room expired and was removed");
                }
                Ok(SweepOutcome::Alive) => {}
                Err(_) => {
                    self.rooms.remove(&code);
                }
            }
        }
    }
}

fn random_code() -> RoomCode {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    RoomCode::new(format!("{n:06}")).expect("generated code is always 6 digits")
}

pub async fn run_reaper(manager: RoomManager, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        debug!(rooms = manager.room_count(), "reaper sweep starting");
        manager.sweep().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_room_allocates_six_digit_code() {
        let mgr = RoomManager::new();
        let code = mgr.create_room();
        assert_eq!(code.as_str().len(), 6);
        assert!(mgr.contains(&code));
    }

    #[tokio::test]
    async fn sweep_on_fresh_room_keeps_it_alive() {
        let mgr = RoomManager::new();
        let code = mgr.create_room();
        mgr.sweep().await;
        assert!(mgr.contains(&code));
    }
}
