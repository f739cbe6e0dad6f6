use thiserror::Error;

/// Every fallible operation in the connector funnels into one of these. See
/// `SPEC_FULL.md` §7 for the policy attached to each kind.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("signaling dial failed after retries: {0}")]
    Dial(String),

    #[error("signaling conduit closed")]
    Closed,

    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("webrtc handshake failed: {0}")]
    Handshake(String),

    #[error("malformed envelope: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] stardewl_core::CoreError),

    #[error(transparent)]
    Mods(#[from] stardewl_mods::ScanError),
}
