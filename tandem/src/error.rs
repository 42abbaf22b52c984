use std::time::Duration;
use thiserror::Error;

/// Reasons a session could not be established.
///
/// None of these are retried internally; callers restart the whole
/// join-room sequence.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("relay connection failed: {0}")]
    RelayConnect(String),

    #[error("failed to join room '{room}': {reason}")]
    RoomJoin { room: String, reason: String },

    #[error("unexpected room size {size}, a session needs exactly two participants")]
    UnexpectedRoomSize { size: usize },

    #[error("signaling protocol error: {0}")]
    SignalingProtocol(String),

    #[error("negotiation did not complete within {0:?}")]
    NegotiationTimeout(Duration),

    #[error("relay closed the room subscription")]
    RelayClosed,

    #[error("peer transport failure: {0}")]
    PeerTransport(String),
}

impl SessionError {
    pub(crate) fn signaling(context: &str, err: anyhow::Error) -> Self {
        Self::SignalingProtocol(format!("{context}: {err:#}"))
    }

    pub(crate) fn room_join(room: impl ToString, reason: impl Into<String>) -> Self {
        Self::RoomJoin {
            room: room.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
