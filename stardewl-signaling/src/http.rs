use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use stardewl_core::RoomCode;

use crate::app::AppState;

#[derive(Serialize)]
pub struct CreateRoomResponse {
    pub code: String,
}

pub async fn create_room(State(state): State<AppState>) -> impl IntoResponse {
    let code = state.rooms.create_room();
    Json(CreateRoomResponse { code: code.to_string() })
}

#[derive(Serialize)]
pub struct JoinRoomResponse {
    pub status: &'static str,
    pub code: String,
    pub ready: bool,
}

pub async fn join_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> impl IntoResponse {
    let Ok(code) = RoomCode::new(code) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(ready) = state.rooms.host_present(&code).await else {
        return StatusCode::NOT_FOUND.into_response();
    };
    Json(JoinRoomResponse { status: "room_exists", code: code.to_string(), ready }).into_response()
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: u64,
    pub connections: usize,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp =
        std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_secs();
    Json(HealthResponse { status: "healthy", timestamp, connections: state.rooms.connection_count() })
}
