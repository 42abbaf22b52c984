use crate::model::member::MemberId;
use crate::model::room::RoomName;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frames of the JSON room relay protocol spoken over a WebSocket.
///
/// The relay greets every connection with `Welcome`, answers `Subscribe`
/// with either `Members` or `Error`, and fans every `Publish` out as
/// `Message` to all subscribers of the room, publisher included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RelayFrame {
    Subscribe {
        room: RoomName,
    },
    Unsubscribe {
        room: RoomName,
    },
    Publish {
        room: RoomName,
        message: Value,
    },
    Welcome {
        client_id: MemberId,
    },
    Members {
        room: RoomName,
        members: Vec<MemberId>,
    },
    Message {
        room: RoomName,
        client_id: MemberId,
        message: Value,
    },
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room: Option<RoomName>,
        reason: String,
    },
}
