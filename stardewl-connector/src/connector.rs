use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;
use stardewl_core::{AppMessage, ModComparison, RoomCode, SignalType};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::data_channel::RTCDataChannel;
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;

use crate::error::ConnectorError;
use crate::ice_queue::DeferredIceQueue;
use crate::signaling_client::SignalingClient;
use crate::state::{HandshakeState, Role};

const DATA_CHANNEL_LABEL: &str = "stardewl";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const MAX_HEARTBEAT_FAILURES: u32 = 3;

pub type ModsCheckedCallback = Arc<dyn Fn(ModComparison) + Send + Sync>;
pub type DisconnectedCallback = Arc<dyn Fn() + Send + Sync>;

/// What the caller supplies to stand up a session (`SPEC_FULL.md` §4.3,
/// "Construction").
pub struct P2pConnectorConfig {
    pub signaling_url: String,
    pub room_code: RoomCode,
    pub is_host: bool,
    pub mods_path: PathBuf,
    pub ice_servers: Vec<String>,
}

/// Events pushed out of the peer connection's own callbacks. Kept separate
/// from [`Shared`] so the peer-connection callbacks can be armed the moment
/// the connection is built, before the signaling client (and therefore
/// `Shared`) exists — matching the construction order the spec calls out:
/// "Builds the peer connection first, registers its callbacks ..., then
/// builds the signaling client."
enum PcEvent {
    LocalIceCandidate(RTCIceCandidateInit),
    RemoteDataChannel(Arc<RTCDataChannel>),
    StateChanged(RTCPeerConnectionState),
}

/// One mutex guards `{connected, callback pointers}` and the handshake tag
/// alongside them (`SPEC_FULL.md` §5); a *separate* lock (inside
/// [`DeferredIceQueue`]) guards the pending-ICE queue, and the two are never
/// held at once.
struct ConnectorCore {
    state: HandshakeState,
    on_mods_checked: Option<ModsCheckedCallback>,
    on_disconnected: Option<DisconnectedCallback>,
}

struct Shared {
    role: Role,
    mods_path: PathBuf,
    peer_connection: Arc<RTCPeerConnection>,
    signaling: SignalingClient,
    data_channel: Mutex<Option<Arc<RTCDataChannel>>>,
    pending_ice: DeferredIceQueue,
    remote_desc_set: AtomicBool,
    core: Mutex<ConnectorCore>,
    disconnected_fired: AtomicBool,
    heartbeat_failures: AtomicU32,
}

/// Owns the WebRTC peer connection and its data channel; orchestrates the
/// SDP + ICE handshake through the signaling client; runs the application
/// protocol once the channel is open (`SPEC_FULL.md` §4.3).
pub struct P2pConnector {
    shared: Arc<Shared>,
}

impl P2pConnector {
    pub async fn connect(config: P2pConnectorConfig) -> Result<Self, ConnectorError> {
        let peer_connection = build_peer_connection(&config.ice_servers).await?;
        let pc_events = register_peer_connection_callbacks(&peer_connection);

        let role = if config.is_host { Role::Host } else { Role::Joiner };
        let signaling =
            SignalingClient::connect(&config.signaling_url, config.room_code.as_str(), config.is_host).await?;

        let shared = Arc::new(Shared {
            role,
            mods_path: config.mods_path,
            peer_connection,
            signaling,
            data_channel: Mutex::new(None),
            pending_ice: DeferredIceQueue::new(),
            remote_desc_set: AtomicBool::new(false),
            core: Mutex::new(ConnectorCore {
                state: HandshakeState::AwaitingSignaling,
                on_mods_checked: None,
                on_disconnected: None,
            }),
            disconnected_fired: AtomicBool::new(false),
            heartbeat_failures: AtomicU32::new(0),
        });

        tokio::spawn(dispatch_pc_events(shared.clone(), pc_events));

        let on_message_shared = shared.clone();
        let on_error_shared = shared.clone();
        shared
            .signaling
            .set_callbacks(
                Arc::new(move |envelope: SignalType| {
                    let shared = on_message_shared.clone();
                    tokio::spawn(async move { shared.handle_signal(envelope).await });
                }),
                Arc::new(|| debug!("signaling connected")),
                Arc::new(move |err: ConnectorError| {
                    let shared = on_error_shared.clone();
                    tokio::spawn(async move {
                        warn!(%err, "signaling transport error");
                        shared.disconnect_once().await;
                    });
                }),
            )
            .await;

        shared.signaling.wait_for_connected(DEFAULT_CONNECT_TIMEOUT).await?;

        if role == Role::Host {
            shared.start_host_offer().await?;
        } else {
            shared.set_state(HandshakeState::AwaitingOffer).await;
        }

        Ok(Self { shared })
    }

    /// Installs the application-level lifecycle callbacks. May be called at
    /// any point in the session; there is no queue to replay since both
    /// callbacks fire only after the data channel has something to report.
    pub async fn set_callbacks(&self, on_mods_checked: ModsCheckedCallback, on_disconnected: DisconnectedCallback) {
        let mut core = self.shared.core.lock().await;
        core.on_mods_checked = Some(on_mods_checked);
        core.on_disconnected = Some(on_disconnected);
    }

    /// Sends the local mod list over the data channel, asking the remote side
    /// to compare. Can be called by either side once the channel is open.
    pub async fn send_mods_list(&self) -> Result<(), ConnectorError> {
        self.shared.push_mods_list().await
    }

    pub async fn is_data_channel_open(&self) -> bool {
        self.shared.core.lock().await.state == HandshakeState::DataChannelOpen
    }

    /// Tears down the signaling client then the peer connection; fires
    /// `onDisconnected` exactly once per session.
    pub async fn close(&self) {
        self.shared.disconnect_once().await;
    }
}

async fn build_peer_connection(ice_servers: &[String]) -> Result<Arc<RTCPeerConnection>, ConnectorError> {
    let mut media_engine = MediaEngine::default();
    media_engine.register_default_codecs().map_err(handshake_err)?;
    let registry =
        register_default_interceptors(webrtc::interceptor::registry::Registry::new(), &mut media_engine)
            .map_err(handshake_err)?;

    let api = APIBuilder::new().with_media_engine(media_engine).with_interceptor_registry(registry).build();

    let ice_servers =
        if ice_servers.is_empty() { vec![] } else { vec![RTCIceServer { urls: ice_servers.to_vec(), ..Default::default() }] };
    let config = RTCConfiguration { ice_servers, ..Default::default() };

    Ok(Arc::new(api.new_peer_connection(config).await.map_err(handshake_err)?))
}

fn register_peer_connection_callbacks(pc: &Arc<RTCPeerConnection>) -> mpsc::UnboundedReceiver<PcEvent> {
    let (tx, rx) = mpsc::unbounded_channel();

    let ice_tx = tx.clone();
    pc.on_ice_candidate(Box::new(move |candidate| {
        let ice_tx = ice_tx.clone();
        Box::pin(async move {
            let Some(candidate) = candidate else { return };
            match candidate.to_json() {
                Ok(init) => {
                    let _ = ice_tx.send(PcEvent::LocalIceCandidate(init));
                }
                Err(err) => warn!(%err, "failed to encode local ice candidate"),
            }
        })
    }));

    let state_tx = tx.clone();
    pc.on_peer_connection_state_change(Box::new(move |state| {
        let state_tx = state_tx.clone();
        Box::pin(async move {
            debug!(?state, "peer connection state changed");
            let _ = state_tx.send(PcEvent::StateChanged(state));
        })
    }));

    let dc_tx = tx;
    pc.on_data_channel(Box::new(move |dc| {
        let dc_tx = dc_tx.clone();
        Box::pin(async move {
            let _ = dc_tx.send(PcEvent::RemoteDataChannel(dc));
        })
    }));

    rx
}

async fn dispatch_pc_events(shared: Arc<Shared>, mut rx: mpsc::UnboundedReceiver<PcEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            PcEvent::LocalIceCandidate(candidate) => match serde_json::to_value(&candidate) {
                Ok(value) => {
                    if let Err(err) = shared.signaling.send(SignalType::IceCandidate { candidate: value }).await {
                        warn!(%err, "failed to send local ice candidate");
                    }
                }
                Err(err) => warn!(%err, "failed to encode local ice candidate"),
            },
            PcEvent::RemoteDataChannel(dc) => {
                if shared.role == Role::Joiner {
                    shared.register_data_channel(dc).await;
                }
            }
            PcEvent::StateChanged(state) => {
                if matches!(state, RTCPeerConnectionState::Failed | RTCPeerConnectionState::Closed) {
                    shared.disconnect_once().await;
                }
            }
        }
    }
}

impl Shared {
    async fn set_state(&self, state: HandshakeState) {
        self.core.lock().await.state = state;
    }

    /// Host-side offer flow: create the data channel eagerly, create the
    /// offer, wait for ICE gathering to finish, then send it. `SPEC_FULL.md`
    /// §5 treats `CreateOffer` as blocking until gathering completes — the
    /// reason trickled candidates (sent individually by
    /// [`register_peer_connection_callbacks`]) and the final SDP both carry
    /// the full candidate set, belt and suspenders against a signaling
    /// implementation that drops ICE frames.
    async fn start_host_offer(self: &Arc<Self>) -> Result<(), ConnectorError> {
        let dc = self.peer_connection.create_data_channel(DATA_CHANNEL_LABEL, None).await.map_err(handshake_err)?;
        self.register_data_channel(dc).await;

        let offer = self.peer_connection.create_offer(None).await.map_err(handshake_err)?;
        self.peer_connection.set_local_description(offer).await.map_err(handshake_err)?;
        wait_ice_gathering_complete(&self.peer_connection).await;

        let local = self
            .peer_connection
            .local_description()
            .await
            .ok_or_else(|| ConnectorError::Handshake("missing local description after offer".into()))?;
        self.signaling.send(SignalType::Offer { offer: serde_json::to_value(&local)? }).await?;
        self.set_state(HandshakeState::OfferSent).await;
        Ok(())
    }

    async fn handle_signal(self: Arc<Self>, envelope: SignalType) {
        match envelope {
            SignalType::Offer { offer } => {
                if self.role == Role::Host {
                    warn!("ignoring role-mismatched offer (host received an offer)");
                    return;
                }
                if let Err(err) = self.handle_offer(offer).await {
                    warn!(%err, "failed to process offer");
                }
            }
            SignalType::Answer { answer } => {
                if self.role == Role::Joiner {
                    warn!("ignoring role-mismatched answer (joiner received an answer)");
                    return;
                }
                if let Err(err) = self.handle_answer(answer).await {
                    warn!(%err, "failed to process answer");
                }
            }
            SignalType::IceCandidate { candidate } => match serde_json::from_value::<RTCIceCandidateInit>(candidate) {
                Ok(candidate) => self.handle_remote_ice(candidate).await,
                Err(err) => warn!(%err, "malformed remote ice candidate"),
            },
            SignalType::ClientConnected { client_id } => {
                info!(%client_id, "new client connected to room");
            }
            SignalType::ClientDisconnected { client_id } => {
                info!(%client_id, "client disconnected from room");
            }
            SignalType::HostDisconnected => {
                warn!("host disconnected, tearing down session");
                self.disconnect_once().await;
            }
            SignalType::Error { error } => {
                warn!(%error, "signaling service reported an error");
            }
            SignalType::Connected | SignalType::Ping | SignalType::Pong => {
                // Handled entirely inside the signaling client / service.
            }
        }
    }

    async fn handle_offer(self: &Arc<Self>, offer_json: Value) -> Result<(), ConnectorError> {
        let offer: RTCSessionDescription = serde_json::from_value(offer_json)?;
        self.peer_connection.set_remote_description(offer).await.map_err(handshake_err)?;
        self.remote_desc_set.store(true, Ordering::Release);
        self.flush_pending_ice().await;

        let answer = self.peer_connection.create_answer(None).await.map_err(handshake_err)?;
        self.peer_connection.set_local_description(answer).await.map_err(handshake_err)?;
        wait_ice_gathering_complete(&self.peer_connection).await;

        let local = self
            .peer_connection
            .local_description()
            .await
            .ok_or_else(|| ConnectorError::Handshake("missing local description after answer".into()))?;
        self.signaling.send(SignalType::Answer { answer: serde_json::to_value(&local)? }).await?;
        self.set_state(HandshakeState::RemoteDescSet).await;
        Ok(())
    }

    async fn handle_answer(self: &Arc<Self>, answer_json: Value) -> Result<(), ConnectorError> {
        let answer: RTCSessionDescription = serde_json::from_value(answer_json)?;
        self.peer_connection.set_remote_description(answer).await.map_err(handshake_err)?;
        self.remote_desc_set.store(true, Ordering::Release);
        self.flush_pending_ice().await;
        self.set_state(HandshakeState::RemoteDescSet).await;
        Ok(())
    }

    /// Applies a remote candidate directly if the remote description is
    /// already installed, otherwise defers it (`SPEC_FULL.md` §3: "Pending
    /// ICE candidates are discarded only after a successful remote-description
    /// installation ... or when the peer connection closes").
    async fn handle_remote_ice(self: &Arc<Self>, candidate: RTCIceCandidateInit) {
        if self.remote_desc_set.load(Ordering::Acquire) {
            if let Err(err) = self.peer_connection.add_ice_candidate(candidate).await {
                warn!(%err, "failed to add ice candidate");
            }
        } else if !self.pending_ice.push(candidate).await {
            warn!("deferred ice queue full, dropping candidate");
        }
    }

    async fn flush_pending_ice(self: &Arc<Self>) {
        for candidate in self.pending_ice.drain().await {
            if let Err(err) = self.peer_connection.add_ice_candidate(candidate).await {
                warn!(%err, "failed to add deferred ice candidate");
            }
        }
    }

    async fn register_data_channel(self: &Arc<Self>, dc: Arc<RTCDataChannel>) {
        *self.data_channel.lock().await = Some(dc.clone());

        let open_shared = self.clone();
        dc.on_open(Box::new(move || {
            let open_shared = open_shared.clone();
            Box::pin(async move { open_shared.on_data_channel_open().await })
        }));

        let msg_shared = self.clone();
        dc.on_message(Box::new(move |msg: DataChannelMessage| {
            let msg_shared = msg_shared.clone();
            Box::pin(async move { msg_shared.on_data_channel_message(msg).await })
        }));

        let close_shared = self.clone();
        dc.on_close(Box::new(move || {
            let close_shared = close_shared.clone();
            Box::pin(async move { close_shared.disconnect_once().await })
        }));
    }

    async fn on_data_channel_open(self: &Arc<Self>) {
        self.set_state(HandshakeState::DataChannelOpen).await;
        info!("data channel open");

        let heartbeat_shared = self.clone();
        tokio::spawn(async move { heartbeat_shared.heartbeat_loop().await });

        if self.role == Role::Host {
            let shared = self.clone();
            tokio::spawn(async move {
                if let Err(err) = shared.push_mods_list().await {
                    warn!(%err, "failed to push initial mods list");
                }
            });
        }
    }

    async fn on_data_channel_message(self: &Arc<Self>, msg: DataChannelMessage) {
        match serde_json::from_slice::<AppMessage>(&msg.data) {
            Ok(app_msg) => self.handle_app_message(app_msg).await,
            Err(err) => warn!(%err, "dropping malformed application message"),
        }
    }

    async fn handle_app_message(self: &Arc<Self>, msg: AppMessage) {
        match msg {
            AppMessage::ModsList { mods } => {
                let local = match stardewl_mods::scan(&self.mods_path) {
                    Ok(mods) => mods,
                    Err(err) => {
                        warn!(%err, "failed to scan local mods");
                        Vec::new()
                    }
                };
                let comparison = stardewl_mods::compare(&local, &mods);
                if let Err(err) = self.send_app(AppMessage::ModsComparison { comparison: comparison.clone() }).await {
                    warn!(%err, "failed to reply with mods comparison");
                }
                self.fire_mods_checked(comparison).await;
            }
            AppMessage::ModsComparison { comparison } => {
                self.fire_mods_checked(comparison).await;
            }
            AppMessage::Ping => {
                if let Err(err) = self.send_app(AppMessage::Pong).await {
                    warn!(%err, "failed to reply to ping");
                }
            }
            AppMessage::Pong => {
                self.heartbeat_failures.store(0, Ordering::Relaxed);
            }
            AppMessage::GameReady => info!("remote side reports game ready"),
            AppMessage::Error { code, message } => warn!(%code, %message, "remote application error"),
        }
    }

    async fn fire_mods_checked(&self, comparison: ModComparison) {
        let cb = { self.core.lock().await.on_mods_checked.clone() };
        if let Some(cb) = cb {
            cb(comparison);
        }
    }

    async fn push_mods_list(self: &Arc<Self>) -> Result<(), ConnectorError> {
        let mods = stardewl_mods::scan(&self.mods_path)?;
        self.send_app(AppMessage::ModsList { mods }).await
    }

    async fn send_app(&self, msg: AppMessage) -> Result<(), ConnectorError> {
        let dc = self.data_channel.lock().await.clone().ok_or(ConnectorError::Closed)?;
        let bytes = serde_json::to_vec(&msg)?;
        dc.send(&Bytes::from(bytes)).await.map_err(handshake_err)?;
        Ok(())
    }

    async fn heartbeat_loop(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(HEARTBEAT_INTERVAL);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if self.core.lock().await.state != HandshakeState::DataChannelOpen {
                break;
            }
            match self.send_app(AppMessage::Ping).await {
                Ok(()) => {}
                Err(err) => {
                    let failures = self.heartbeat_failures.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!(%err, failures, "heartbeat ping failed");
                    if failures >= MAX_HEARTBEAT_FAILURES {
                        self.disconnect_once().await;
                        break;
                    }
                }
            }
        }
    }

    /// Tears down the session exactly once, regardless of which trigger
    /// (explicit close, host disconnect, ICE failure, repeated heartbeat
    /// failure) got there first.
    async fn disconnect_once(self: &Arc<Self>) {
        if self.disconnected_fired.swap(true, Ordering::AcqRel) {
            return;
        }
        self.set_state(HandshakeState::Closed).await;
        self.pending_ice.clear().await;
        self.signaling.close().await;
        let _ = self.peer_connection.close().await;

        let cb = { self.core.lock().await.on_disconnected.clone() };
        if let Some(cb) = cb {
            cb();
        }
    }
}

async fn wait_ice_gathering_complete(pc: &RTCPeerConnection) {
    let mut rx = pc.gathering_complete_promise().await;
    let _ = rx.recv().await;
}

fn handshake_err(err: impl std::fmt::Display) -> ConnectorError {
    ConnectorError::Handshake(err.to_string())
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    use super::*;

    /// A bare-bones stand-in for the signaling service: accepts one
    /// connection, discards the join envelope, acks with `{"type":"connected"}`,
    /// then just drains whatever else arrives. Enough for `P2pConnector::connect`
    /// to complete without standing up the full axum service.
    async fn spawn_stub_signaling_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else { return };
            let Ok(ws) = tokio_tungstenite::accept_async(stream).await else { return };
            let (mut sink, mut stream) = ws.split();
            let _ = stream.next().await; // join envelope, contents unused
            let ack = serde_json::to_string(&SignalType::Connected).unwrap();
            let _ = sink.send(WsMessage::Text(ack.into())).await;
            while stream.next().await.is_some() {}
        });
        format!("ws://{addr}")
    }

    fn fake_ice(port: &str) -> RTCIceCandidateInit {
        RTCIceCandidateInit {
            candidate: format!("candidate:0 1 udp 2122252543 192.0.2.1 {port} typ host"),
            ..Default::default()
        }
    }

    async fn connect_joiner(signaling_url: String) -> P2pConnector {
        let config = P2pConnectorConfig {
            signaling_url,
            room_code: RoomCode::new("482913").unwrap(),
            is_host: false,
            mods_path: std::env::temp_dir(),
            ice_servers: vec![],
        };
        P2pConnector::connect(config).await.expect("joiner connect should succeed against the stub server")
    }

    #[tokio::test]
    async fn joiner_ignores_role_mismatched_answer() {
        let url = spawn_stub_signaling_server().await;
        let connector = connect_joiner(url).await;

        connector.shared.clone().handle_signal(SignalType::Answer { answer: serde_json::json!({}) }).await;

        let state = connector.shared.core.lock().await.state;
        assert_eq!(
            state,
            HandshakeState::AwaitingOffer,
            "a role-mismatched answer must be ignored, not change the joiner's state"
        );
    }

    #[tokio::test]
    async fn host_ignores_role_mismatched_offer() {
        let url = spawn_stub_signaling_server().await;
        let config = P2pConnectorConfig {
            signaling_url: url,
            room_code: RoomCode::new("111222").unwrap(),
            is_host: true,
            mods_path: std::env::temp_dir(),
            ice_servers: vec![],
        };
        let connector =
            P2pConnector::connect(config).await.expect("host connect should succeed against the stub server");

        connector.shared.clone().handle_signal(SignalType::Offer { offer: serde_json::json!({}) }).await;

        let state = connector.shared.core.lock().await.state;
        assert_eq!(
            state,
            HandshakeState::OfferSent,
            "a role-mismatched offer must be ignored, not change the host's own state"
        );
    }

    /// Scenario S3: ICE candidates that arrive before the remote description
    /// is installed are deferred, then flushed in arrival order once a real
    /// `set_remote_description` succeeds — exercised end to end through
    /// `Shared::handle_offer`, not just the bare `DeferredIceQueue`.
    #[tokio::test]
    async fn ice_candidates_before_remote_desc_are_deferred_then_flushed() {
        let url = spawn_stub_signaling_server().await;
        let connector = connect_joiner(url).await;

        connector.shared.handle_remote_ice(fake_ice("50000")).await;
        connector.shared.handle_remote_ice(fake_ice("50001")).await;
        connector.shared.handle_remote_ice(fake_ice("50002")).await;
        assert_eq!(
            connector.shared.pending_ice.len().await,
            3,
            "candidates arriving before the remote description must be deferred, not dropped or applied early"
        );
        assert!(!connector.shared.remote_desc_set.load(Ordering::Acquire));

        // A second, independent peer connection stands in for the host and
        // produces a genuine SDP offer, so `set_remote_description` below is
        // real rather than a fabricated payload.
        let remote_pc = build_peer_connection(&[]).await.unwrap();
        let offer = remote_pc.create_offer(None).await.unwrap();
        remote_pc.set_local_description(offer).await.unwrap();
        wait_ice_gathering_complete(&remote_pc).await;
        let local_desc = remote_pc.local_description().await.unwrap();

        connector.shared.handle_offer(serde_json::to_value(&local_desc).unwrap()).await.unwrap();

        assert!(connector.shared.remote_desc_set.load(Ordering::Acquire));
        assert_eq!(
            connector.shared.pending_ice.len().await,
            0,
            "deferred candidates must be flushed once the remote description installs"
        );
    }
}
