use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use stardewl_core::{ClientId, JoinEnvelope, RoomCode, SignalType};
use tokio::sync::mpsc::unbounded_channel;
use tokio::sync::oneshot;
use tracing::warn;

use crate::app::AppState;
use crate::room::RoomCommand;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let Some(join) = read_join_envelope(&mut socket).await else {
        return;
    };

    let Ok(code) = RoomCode::new(join.connection_id.clone()) else {
        send_error_and_close(&mut socket, "unknown room code").await;
        return;
    };

    let Some(handle) = state.rooms.get(&code) else {
        send_error_and_close(&mut socket, "room not found").await;
        return;
    };

    let client_id = ClientId::new(&code, high_res_timestamp_nanos());

    let (outbound_tx, mut outbound_rx) = unbounded_channel::<SignalType>();
    let (reply_tx, reply_rx) = oneshot::channel();
    if handle
        .tx
        .send(RoomCommand::Join { client_id: client_id.clone(), is_host: join.is_host, outbound: outbound_tx, reply: reply_tx })
        .await
        .is_err()
    {
        send_error_and_close(&mut socket, "room is shutting down").await;
        return;
    }

    match reply_rx.await {
        Ok(Ok(())) => {}
        Ok(Err(_join_error)) => {
            send_error_and_close(&mut socket, "room already has a host").await;
            return;
        }
        Err(_) => {
            send_error_and_close(&mut socket, "room is shutting down").await;
            return;
        }
    }

    let (mut sink, mut stream) = socket.split();

    let send_task = tokio::spawn(async move {
        while let Some(envelope) = outbound_rx.recv().await {
            let Ok(text) = serde_json::to_string(&envelope) else { continue };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let room_tx = handle.tx.clone();
    let recv_client_id = client_id.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = stream.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<SignalType>(&text) {
                    Ok(envelope) => {
                        let _ = room_tx.send(RoomCommand::Frame { client_id: recv_client_id.clone(), envelope }).await;
                    }
                    Err(err) => warn!(%err, "dropping malformed signaling frame"),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    let _ = handle.tx.send(RoomCommand::Leave { client_id }).await;
}

async fn read_join_envelope(socket: &mut WebSocket) -> Option<JoinEnvelope> {
    let msg = socket.next().await?.ok()?;
    let Message::Text(text) = msg else {
        send_error_and_close(socket, "expected join envelope").await;
        return None;
    };
    match serde_json::from_str::<JoinEnvelope>(&text) {
        Ok(join) => Some(join),
        Err(_) => {
            send_error_and_close(socket, "malformed join envelope").await;
            None
        }
    }
}

async fn send_error_and_close(socket: &mut WebSocket, message: &str) {
    let envelope = SignalType::Error { error: message.to_string() };
    if let Ok(text) = serde_json::to_string(&envelope) {
        let _ = socket.send(Message::Text(text.into())).await;
    }
    let _ = socket.close().await;
}

fn high_res_timestamp_nanos() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos()
}
