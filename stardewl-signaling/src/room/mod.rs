mod actor;
mod command;
mod error;
mod registry;

pub use actor::Room;
pub use command::{OutboundTx, RoomCommand, SweepOutcome};
pub use error::JoinError;
pub use registry::{run_reaper, RoomHandle, RoomManager};
