use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed room code: {0}")]
    InvalidRoomCode(String),

    #[error("envelope decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}
