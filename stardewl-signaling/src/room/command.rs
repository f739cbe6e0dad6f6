use stardewl_core::{ClientId, SignalType};
use tokio::sync::{mpsc, oneshot};

use super::error::JoinError;

/// Per-binding outbound channel; the WebSocket send task drains this and
/// writes each envelope to the socket.
pub type OutboundTx = mpsc::UnboundedSender<SignalType>;

#[derive(Debug)]
pub enum RoomCommand {
    Join {
        client_id: ClientId,
        is_host: bool,
        outbound: OutboundTx,
        reply: oneshot::Sender<Result<(), JoinError>>,
    },
    Frame {
        client_id: ClientId,
        envelope: SignalType,
    },
    Leave {
        client_id: ClientId,
    },
    Sweep {
        reply: oneshot::Sender<SweepOutcome>,
    },
    HasHost {
        reply: oneshot::Sender<bool>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    Alive,
    ExpiredEmpty,
}
