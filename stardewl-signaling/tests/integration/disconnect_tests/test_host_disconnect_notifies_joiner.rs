use stardewl_core::SignalType;

use crate::integration::{connected_client, spawn_test_server};

#[tokio::test]
async fn joiner_is_notified_when_host_disconnects() {
    let server = spawn_test_server().await;
    let code = server.rooms.create_room();
    let host = connected_client(server.addr, code.as_str(), true).await;
    let mut joiner = connected_client(server.addr, code.as_str(), false).await;

    drop(host);

    let notice = joiner.recv().await;
    assert!(matches!(notice, SignalType::HostDisconnected), "expected host_disconnected, got {notice:?}");
}
