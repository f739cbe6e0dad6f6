use stardewl_core::SignalType;

use crate::integration::{connected_client, spawn_test_server};

#[tokio::test]
async fn answer_from_joiner_is_forwarded_only_to_host() {
    let server = spawn_test_server().await;
    let code = server.rooms.create_room();
    let mut host = connected_client(server.addr, code.as_str(), true).await;
    let mut joiner = connected_client(server.addr, code.as_str(), false).await;
    let _client_connected = host.recv().await;

    joiner.send(SignalType::Answer { answer: serde_json::json!({"sdp": "answer-body"}) }).await;
    let forwarded = host.recv().await;
    assert!(matches!(forwarded, SignalType::Answer { .. }), "expected answer forwarded to host, got {forwarded:?}");
}

#[tokio::test]
async fn ice_candidate_from_host_reaches_joiner_and_is_buffered() {
    let server = spawn_test_server().await;
    let code = server.rooms.create_room();
    let mut host = connected_client(server.addr, code.as_str(), true).await;
    let mut joiner = connected_client(server.addr, code.as_str(), false).await;
    let _client_connected = host.recv().await;

    host.send(SignalType::IceCandidate { candidate: serde_json::json!({"candidate": "host-candidate"}) }).await;
    let forwarded = joiner.recv().await;
    assert!(matches!(forwarded, SignalType::IceCandidate { .. }), "expected ice candidate, got {forwarded:?}");
}
