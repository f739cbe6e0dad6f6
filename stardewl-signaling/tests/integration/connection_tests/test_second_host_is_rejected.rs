use crate::integration::{connected_client, spawn_test_server};
use crate::utils::TestClient;

#[tokio::test]
async fn second_host_join_gets_an_error_and_no_ack() {
    let server = spawn_test_server().await;
    let code = server.rooms.create_room();
    let _host = connected_client(server.addr, code.as_str(), true).await;

    let mut second = TestClient::connect(&format!("ws://{}/ws", server.addr)).await;
    second.join(code.as_str(), true).await;
    let reply = second.recv().await;
    assert!(matches!(reply, stardewl_core::SignalType::Error { .. }), "expected error, got {reply:?}");
}
