use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the handshake this process plays.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Second joiner: creates the data channel and sends the offer.
    Initiator,
    /// First joiner: waits for the offer and answers it.
    Responder,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Initiator => write!(f, "initiator"),
            Role::Responder => write!(f, "responder"),
        }
    }
}
