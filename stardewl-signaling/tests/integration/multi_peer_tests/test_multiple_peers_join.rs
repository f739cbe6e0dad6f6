use std::time::Duration;

use stardewl_core::SignalType;

use crate::integration::{connected_client, spawn_test_server};

#[tokio::test]
async fn joiner_receives_offer_buffered_before_it_arrived() {
    let server = spawn_test_server().await;
    let code = server.rooms.create_room();
    let mut host = connected_client(server.addr, code.as_str(), true).await;

    host.send(SignalType::Offer { offer: serde_json::json!({"sdp": "offer-body"}) }).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut joiner = connected_client(server.addr, code.as_str(), false).await;
    let offer = joiner.recv().await;
    assert!(matches!(offer, SignalType::Offer { .. }), "expected buffered offer, got {offer:?}");
}

#[tokio::test]
async fn host_is_notified_when_a_joiner_connects() {
    let server = spawn_test_server().await;
    let code = server.rooms.create_room();
    let mut host = connected_client(server.addr, code.as_str(), true).await;
    let _joiner = connected_client(server.addr, code.as_str(), false).await;

    let notice = host.recv().await;
    assert!(matches!(notice, SignalType::ClientConnected { .. }), "expected client_connected, got {notice:?}");
}
