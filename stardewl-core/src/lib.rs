//! Shared wire types for the stardewl signaling and P2P connector crates.

pub mod error;
pub mod mods;
pub mod room;
pub mod signal;

pub use error::CoreError;
pub use mods::{ModComparison, ModDiff, ModInfo};
pub use room::{ClientId, RoomCode};
pub use signal::{AppMessage, JoinEnvelope, SignalEnvelope, SignalType};
