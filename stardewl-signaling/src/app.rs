use axum::routing::{get, post};
use axum::Router;

use crate::http::{create_room, health, join_room};
use crate::room::RoomManager;
use crate::signaling::ws_handler;

#[derive(Clone)]
pub struct AppState {
    pub rooms: RoomManager,
}

pub fn build_app(rooms: RoomManager) -> Router {
    let state = AppState { rooms };
    Router::new()
        .route("/create", post(create_room))
        .route("/join/{code}", get(join_room))
        .route("/health", get(health))
        .route("/ws", get(ws_handler))
        .with_state(state)
}
