use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use stardewl_core::{JoinEnvelope, SignalType};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

const RECV_TIMEOUT: Duration = Duration::from_secs(3);

/// A minimal native WebSocket client used to drive the signaling service's
/// `/ws` protocol from tests, without dragging in a real WebRTC stack.
pub struct TestClient {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    pub async fn connect(url: &str) -> Self {
        let (socket, _response) = connect_async(url).await.expect("failed to connect to signaling service");
        Self { socket }
    }

    pub async fn join(&mut self, connection_id: &str, is_host: bool) {
        let envelope = JoinEnvelope { connection_id: connection_id.to_string(), is_host };
        let text = serde_json::to_string(&envelope).unwrap();
        self.socket.send(Message::Text(text.into())).await.unwrap();
    }

    pub async fn send(&mut self, envelope: SignalType) {
        let text = serde_json::to_string(&envelope).unwrap();
        self.socket.send(Message::Text(text.into())).await.unwrap();
    }

    pub async fn recv(&mut self) -> SignalType {
        tokio::time::timeout(RECV_TIMEOUT, async {
            loop {
                match self.socket.next().await {
                    Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
                    Some(Ok(_)) => continue,
                    other => panic!("signaling socket closed unexpectedly: {other:?}"),
                }
            }
        })
        .await
        .expect("timed out waiting for a signaling frame")
    }
}
