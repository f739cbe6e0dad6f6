use std::net::SocketAddr;

use stardewl_signaling::{build_app, RoomManager};

use crate::utils::TestClient;

pub mod connection_tests;
pub mod disconnect_tests;
pub mod http_tests;
pub mod messaging_tests;
pub mod multi_peer_tests;

pub struct TestServer {
    pub addr: SocketAddr,
    pub rooms: RoomManager,
}

pub async fn spawn_test_server() -> TestServer {
    let rooms = RoomManager::new();
    let app = build_app(rooms.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer { addr, rooms }
}

/// Connects, joins, and consumes the `connected` acknowledgement.
pub async fn connected_client(addr: SocketAddr, code: &str, is_host: bool) -> TestClient {
    let mut client = TestClient::connect(&format!("ws://{addr}/ws")).await;
    client.join(code, is_host).await;
    let ack = client.recv().await;
    assert!(matches!(ack, stardewl_core::SignalType::Connected), "expected connected ack, got {ack:?}");
    client
}
