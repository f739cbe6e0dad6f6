use stardewl_core::SignalType;

use crate::integration::{connected_client, spawn_test_server};

#[tokio::test]
async fn ping_is_answered_with_pong() {
    let server = spawn_test_server().await;
    let code = server.rooms.create_room();
    let mut host = connected_client(server.addr, code.as_str(), true).await;

    host.send(SignalType::Ping).await;
    let reply = host.recv().await;
    assert!(matches!(reply, SignalType::Pong), "expected pong, got {reply:?}");
}
