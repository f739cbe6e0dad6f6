use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A 6-digit decimal room code, the sole identity a room is addressed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    pub fn new(code: impl Into<String>) -> Result<Self, CoreError> {
        let code = code.into();
        if code.len() == 6 && code.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(code))
        } else {
            Err(CoreError::InvalidRoomCode(code))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

/// Identifies a single WebSocket binding within a room, generated by the
/// signaling service at bind time (never supplied by the client).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(room: &RoomCode, high_res_timestamp_nanos: u128) -> Self {
        Self(format!("{room}-{high_res_timestamp_nanos}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ClientId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_six_digit_code() {
        assert!(RoomCode::new("123456").is_ok());
    }

    #[test]
    fn rejects_non_digit_or_wrong_length() {
        assert!(RoomCode::new("12345").is_err());
        assert!(RoomCode::new("abcdef").is_err());
        assert!(RoomCode::new("1234567").is_err());
    }

    #[test]
    fn client_id_embeds_room_code() {
        let room = RoomCode::new("000042").unwrap();
        let id = ClientId::new(&room, 123);
        assert_eq!(id.as_str(), "000042-123");
    }
}
