pub mod app;
pub mod http;
pub mod room;
pub mod signaling;

pub use app::{build_app, AppState};
pub use room::RoomManager;
