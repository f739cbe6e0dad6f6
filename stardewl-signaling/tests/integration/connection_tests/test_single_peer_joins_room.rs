use crate::integration::{connected_client, spawn_test_server};

#[tokio::test]
async fn host_can_join_a_created_room() {
    let server = spawn_test_server().await;
    let code = server.rooms.create_room();
    let _host = connected_client(server.addr, code.as_str(), true).await;
}

#[tokio::test]
async fn joiner_can_join_after_host() {
    let server = spawn_test_server().await;
    let code = server.rooms.create_room();
    let _host = connected_client(server.addr, code.as_str(), true).await;
    let _joiner = connected_client(server.addr, code.as_str(), false).await;
}
