use crate::negotiation::{DEFAULT_NEGOTIATION_TIMEOUT, DEFAULT_CHANNEL_LABEL};
use crate::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tandem_core::{DEFAULT_ROOM_PREFIX, RoomName};

/// Everything [`establish_session`](crate::establish_session) needs besides the relay and room.
///
/// Deserializes from the same JSON shape browsers use for their peer
/// connection configuration, with extra optional keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    #[serde(flatten)]
    pub transport: TransportConfig,

    #[serde(default = "default_room_prefix")]
    pub room_prefix: String,

    #[serde(default = "default_negotiation_timeout_ms")]
    pub negotiation_timeout_ms: u64,

    #[serde(default = "default_channel_label")]
    pub channel_label: String,
}

impl SessionConfig {
    pub fn negotiation_timeout(&self) -> Duration {
        Duration::from_millis(self.negotiation_timeout_ms)
    }

    pub fn with_negotiation_timeout(mut self, timeout: Duration) -> Self {
        self.negotiation_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// The relay-level room for a caller-supplied name.
    pub fn room_name(&self, room: &str) -> RoomName {
        RoomName::namespaced(&self.room_prefix, room)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            room_prefix: default_room_prefix(),
            negotiation_timeout_ms: default_negotiation_timeout_ms(),
            channel_label: default_channel_label(),
        }
    }
}

fn default_room_prefix() -> String {
    DEFAULT_ROOM_PREFIX.to_owned()
}

fn default_negotiation_timeout_ms() -> u64 {
    DEFAULT_NEGOTIATION_TIMEOUT.as_millis() as u64
}

fn default_channel_label() -> String {
    DEFAULT_CHANNEL_LABEL.to_owned()
}
