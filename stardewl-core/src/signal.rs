use serde::{Deserialize, Serialize};

use crate::mods::ModComparison;
use crate::mods::ModInfo;

/// The very first frame a client sends on `/ws`, before any `SignalEnvelope`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinEnvelope {
    pub connection_id: String,
    pub is_host: bool,
}

/// An opaque SDP session description, carried as-is between endpoints.
pub type Sdp = serde_json::Value;

/// An opaque ICE candidate, carried as-is between endpoints.
pub type IceCandidate = serde_json::Value;

/// A signaling-service envelope. Serializes as `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SignalType {
    Offer { offer: Sdp },
    Answer { answer: Sdp },
    IceCandidate { candidate: IceCandidate },
    Ping,
    Pong,
    Connected,
    ClientConnected { client_id: String },
    HostDisconnected,
    ClientDisconnected { client_id: String },
    Error { error: String },
}

/// Alias kept for readability at call sites; identical to [`SignalType`].
pub type SignalEnvelope = SignalType;

/// Data-channel application protocol, carried once the `stardewl` channel is open.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum AppMessage {
    ModsList { mods: Vec<ModInfo> },
    ModsComparison { comparison: ModComparison },
    GameReady,
    Ping,
    Pong,
    Error { code: String, message: String },
}
