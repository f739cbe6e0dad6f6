use serde_json::Value;

use crate::integration::{connected_client, spawn_test_server};

#[tokio::test]
async fn create_then_join_round_trip() {
    let server = spawn_test_server().await;
    let client = reqwest::Client::new();

    let created: Value =
        client.post(format!("http://{}/create", server.addr)).send().await.unwrap().json().await.unwrap();
    let code = created["code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 6);

    let joined = client.get(format!("http://{}/join/{code}", server.addr)).send().await.unwrap();
    assert_eq!(joined.status(), 200);
    let body: Value = joined.json().await.unwrap();
    assert_eq!(body["status"], "room_exists");
    assert_eq!(body["ready"], false);
}

#[tokio::test]
async fn join_unknown_code_is_404() {
    let server = spawn_test_server().await;
    let client = reqwest::Client::new();
    let resp = client.get(format!("http://{}/join/000000", server.addr)).send().await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn health_reports_live_bindings_not_rooms() {
    let server = spawn_test_server().await;
    let client = reqwest::Client::new();

    // An empty room with no bindings must not count towards `connections`.
    let code = server.rooms.create_room();
    let resp: Value =
        client.get(format!("http://{}/health", server.addr)).send().await.unwrap().json().await.unwrap();
    assert_eq!(resp["status"], "healthy");
    assert_eq!(resp["connections"], 0);

    let _host = connected_client(server.addr, code.as_str(), true).await;
    let resp: Value =
        client.get(format!("http://{}/health", server.addr)).send().await.unwrap().json().await.unwrap();
    assert_eq!(resp["connections"], 1);

    let _joiner = connected_client(server.addr, code.as_str(), false).await;
    let resp: Value =
        client.get(format!("http://{}/health", server.addr)).send().await.unwrap().json().await.unwrap();
    assert_eq!(resp["connections"], 2);
}
