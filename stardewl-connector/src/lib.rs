//! Drives the WebRTC handshake state machine on each endpoint and runs the
//! application protocol over the resulting data channel (`SPEC_FULL.md`
//! §4.2–§4.3).

mod connector;
mod error;
mod ice_queue;
mod signaling_client;
mod state;

pub use connector::{DisconnectedCallback, ModsCheckedCallback, P2pConnector, P2pConnectorConfig};
pub use error::ConnectorError;
pub use signaling_client::SignalingClient;
pub use state::{HandshakeState, Role};
