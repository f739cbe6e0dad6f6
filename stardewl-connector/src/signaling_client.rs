use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use stardewl_core::{JoinEnvelope, SignalType};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, warn};

use crate::error::ConnectorError;

const CONNECT_RETRIES: usize = 3;
const CONNECT_RETRY_BACKOFF: Duration = Duration::from_secs(1);

pub type MessageCallback = Arc<dyn Fn(SignalType) + Send + Sync>;
pub type ConnectedCallback = Arc<dyn Fn() + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(ConnectorError) + Send + Sync>;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct CallbackState {
    on_message: Option<MessageCallback>,
    on_connected: Option<ConnectedCallback>,
    on_error: Option<ErrorCallback>,
    queue: VecDeque<SignalType>,
    closed: bool,
}

/// The per-endpoint WebSocket conduit to the signaling service (`SPEC_FULL.md`
/// §4.2). Tolerant of the startup race between the moment frames start
/// arriving and the moment the caller installs its callbacks: everything
/// received before [`Self::set_callbacks`] is queued and replayed under the
/// same lock.
pub struct SignalingClient {
    outbound: mpsc::UnboundedSender<Message>,
    callbacks: Arc<Mutex<CallbackState>>,
    connected_tx: watch::Sender<bool>,
    reader: Mutex<Option<JoinHandle<()>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl SignalingClient {
    /// Dials `url` (up to [`CONNECT_RETRIES`] attempts, 1 s backoff), sends
    /// the join envelope, then starts the read loop.
    pub async fn connect(url: &str, room_code: &str, is_host: bool) -> Result<Self, ConnectorError> {
        let mut ws = dial_with_retry(url).await?;

        let join = JoinEnvelope { connection_id: room_code.to_string(), is_host };
        let text = serde_json::to_string(&join)?;
        ws.send(Message::Text(text.into())).await.map_err(|e| ConnectorError::Dial(e.to_string()))?;

        let (mut sink, mut stream) = ws.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

        let writer = tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let is_close = matches!(msg, Message::Close(_));
                if sink.send(msg).await.is_err() {
                    break;
                }
                if is_close {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let callbacks = Arc::new(Mutex::new(CallbackState {
            on_message: None,
            on_connected: None,
            on_error: None,
            queue: VecDeque::new(),
            closed: false,
        }));
        let (connected_tx, _) = watch::channel(false);

        let cb_for_reader = callbacks.clone();
        let connected_for_reader = connected_tx.clone();
        let reader = tokio::spawn(async move {
            loop {
                match stream.next().await {
                    Some(Ok(Message::Text(text))) => match serde_json::from_str::<SignalType>(&text) {
                        Ok(envelope) => dispatch_inbound(&cb_for_reader, &connected_for_reader, envelope).await,
                        Err(err) => warn!(%err, "dropping malformed signaling frame"),
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        warn!(%err, "signaling read error");
                        let cb = { cb_for_reader.lock().await.on_error.clone() };
                        invoke_error_callback(cb, ConnectorError::Closed);
                        break;
                    }
                }
            }
            cb_for_reader.lock().await.closed = true;
            debug!("signaling read loop exited");
        });

        Ok(Self {
            outbound: outbound_tx,
            callbacks,
            connected_tx,
            reader: Mutex::new(Some(reader)),
            writer: Mutex::new(Some(writer)),
        })
    }

    /// Serializes and writes an envelope. Fails with [`ConnectorError::Closed`]
    /// if the conduit has been torn down.
    pub async fn send(&self, envelope: SignalType) -> Result<(), ConnectorError> {
        if self.callbacks.lock().await.closed {
            return Err(ConnectorError::Closed);
        }
        let text = serde_json::to_string(&envelope)?;
        self.outbound.send(Message::Text(text.into())).map_err(|_| ConnectorError::Closed)
    }

    /// Atomically installs the three callbacks. Frames queued between
    /// [`Self::connect`] and this call are replayed in order, under the same
    /// lock, before this returns.
    pub async fn set_callbacks(
        &self,
        on_message: MessageCallback,
        on_connected: ConnectedCallback,
        on_error: ErrorCallback,
    ) {
        let mut guard = self.callbacks.lock().await;
        guard.on_message = Some(on_message.clone());
        guard.on_connected = Some(on_connected);
        guard.on_error = Some(on_error);
        let queued: Vec<SignalType> = guard.queue.drain(..).collect();
        drop(guard);

        for envelope in queued {
            let cb = on_message.clone();
            invoke_catching_panics(Some(cb), envelope);
        }
    }

    /// Resolves once the service's `{type:"connected"}` acknowledgement has
    /// arrived (possibly already, before this call).
    pub async fn wait_for_connected(&self, timeout: Duration) -> Result<(), ConnectorError> {
        let mut rx = self.connected_tx.subscribe();
        if *rx.borrow() {
            return Ok(());
        }
        tokio::time::timeout(timeout, async {
            while !*rx.borrow() {
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
        .await
        .map_err(|_| ConnectorError::Timeout("connected acknowledgement"))
    }

    /// Idempotent tear-down.
    pub async fn close(&self) {
        let mut guard = self.callbacks.lock().await;
        if guard.closed {
            return;
        }
        guard.closed = true;
        drop(guard);
        let _ = self.outbound.send(Message::Close(None));

        if let Some(handle) = self.writer.lock().await.take() {
            let _ = handle.await;
        }
        if let Some(handle) = self.reader.lock().await.take() {
            handle.abort();
        }
    }
}

async fn dispatch_inbound(
    callbacks: &Arc<Mutex<CallbackState>>,
    connected_tx: &watch::Sender<bool>,
    envelope: SignalType,
) {
    if matches!(envelope, SignalType::Connected) {
        let _ = connected_tx.send(true);
        let cb = { callbacks.lock().await.on_connected.clone() };
        if let Some(cb) = cb {
            if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| cb())).is_err() {
                error!("panic in onConnected callback");
            }
        }
        return;
    }

    let mut guard = callbacks.lock().await;
    match guard.on_message.clone() {
        Some(cb) => {
            drop(guard);
            invoke_catching_panics(Some(cb), envelope);
        }
        None => {
            guard.queue.push_back(envelope);
        }
    }
}

fn invoke_catching_panics(cb: Option<MessageCallback>, envelope: SignalType) {
    if let Some(cb) = cb {
        if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| cb(envelope))).is_err() {
            error!("panic in onMessage callback");
        }
    }
}

fn invoke_error_callback(cb: Option<ErrorCallback>, err: ConnectorError) {
    if let Some(cb) = cb {
        if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| cb(err))).is_err() {
            error!("panic in onError callback");
        }
    }
}

async fn dial_with_retry(url: &str) -> Result<WsStream, ConnectorError> {
    let mut last_err = String::new();
    for attempt in 0..CONNECT_RETRIES {
        match connect_async(url).await {
            Ok((stream, _response)) => return Ok(stream),
            Err(err) => {
                warn!(attempt, %err, "signaling dial failed, retrying");
                last_err = err.to_string();
                if attempt + 1 < CONNECT_RETRIES {
                    tokio::time::sleep(CONNECT_RETRY_BACKOFF).await;
                }
            }
        }
    }
    Err(ConnectorError::Dial(last_err))
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;

    use super::*;

    /// Accepts one connection, discards the join envelope, then writes every
    /// frame in `to_send` in order with a small delay between them so the
    /// client's read loop has a chance to queue the early ones before the
    /// test installs callbacks.
    async fn spawn_scripted_server(to_send: Vec<SignalType>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else { return };
            let Ok(ws) = tokio_tungstenite::accept_async(stream).await else { return };
            let (mut sink, mut stream) = ws.split();
            let _ = stream.next().await; // join envelope, contents unused
            for envelope in to_send {
                let text = serde_json::to_string(&envelope).unwrap();
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            while stream.next().await.is_some() {}
        });
        format!("ws://{addr}")
    }

    #[tokio::test]
    async fn wait_for_connected_resolves_once_service_acks() {
        let url = spawn_scripted_server(vec![SignalType::Connected]).await;
        let client = SignalingClient::connect(&url, "111111", false).await.unwrap();
        client.wait_for_connected(Duration::from_secs(5)).await.unwrap();
    }

    #[tokio::test]
    async fn wait_for_connected_times_out_without_an_ack() {
        let url = spawn_scripted_server(vec![]).await;
        let client = SignalingClient::connect(&url, "111111", false).await.unwrap();
        let result = client.wait_for_connected(Duration::from_millis(50)).await;
        assert!(matches!(result, Err(ConnectorError::Timeout(_))));
    }

    /// Frames that arrive before `set_callbacks` is called must be queued and
    /// replayed, in order, once callbacks are installed — not dropped.
    #[tokio::test]
    async fn messages_before_callbacks_are_installed_are_queued_then_replayed_in_order() {
        let url = spawn_scripted_server(vec![
            SignalType::Connected,
            SignalType::ClientConnected { client_id: "first".into() },
            SignalType::ClientConnected { client_id: "second".into() },
        ])
        .await;
        let client = SignalingClient::connect(&url, "111111", false).await.unwrap();

        // Give the read loop time to receive and queue both ClientConnected
        // frames before callbacks are installed.
        tokio::time::sleep(Duration::from_millis(100)).await;

        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let seen_cb = seen.clone();
        client
            .set_callbacks(
                Arc::new(move |envelope| {
                    if let SignalType::ClientConnected { client_id } = envelope {
                        seen_cb.try_lock().unwrap().push(client_id);
                    }
                }),
                Arc::new(|| {}),
                Arc::new(|_| {}),
            )
            .await;

        assert_eq!(*seen.lock().await, vec!["first".to_string(), "second".to_string()]);
    }

    #[tokio::test]
    async fn send_after_close_fails() {
        let url = spawn_scripted_server(vec![SignalType::Connected]).await;
        let client = SignalingClient::connect(&url, "111111", false).await.unwrap();
        client.wait_for_connected(Duration::from_secs(5)).await.unwrap();
        client.close().await;

        let result = client.send(SignalType::Ping).await;
        assert!(matches!(result, Err(ConnectorError::Closed)));
    }
}
