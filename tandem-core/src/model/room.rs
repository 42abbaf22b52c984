use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix separating this application's rooms from other traffic on a shared relay.
pub const DEFAULT_ROOM_PREFIX: &str = "tandem-";

/// Fully qualified room name as used on the relay.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct RoomName(String);

impl RoomName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Qualifies a caller-supplied room name with an application prefix.
    pub fn namespaced(prefix: &str, name: &str) -> Self {
        Self(format!("{prefix}{name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
