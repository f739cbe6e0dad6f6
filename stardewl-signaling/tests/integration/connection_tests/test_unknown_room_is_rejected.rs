use crate::integration::spawn_test_server;
use crate::utils::TestClient;

#[tokio::test]
async fn joining_a_code_never_created_fails() {
    let server = spawn_test_server().await;
    let mut client = TestClient::connect(&format!("ws://{}/ws", server.addr)).await;
    client.join("999999", false).await;
    let reply = client.recv().await;
    assert!(matches!(reply, stardewl_core::SignalType::Error { .. }), "expected error, got {reply:?}");
}
