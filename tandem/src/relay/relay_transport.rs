use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use tandem_core::{MemberId, RoomName};

/// A payload published to a room, tagged with the identity of its publisher.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayMessage {
    pub sender: MemberId,
    pub payload: Value,
}

/// Connection to a signaling relay.
///
/// Implementations own whatever the relay needs (sockets, background tasks)
/// and are passed explicitly to whoever joins rooms through them.
#[async_trait]
pub trait SignalingRelay: Send + Sync {
    type Room: RelayRoom;

    /// Identity the relay assigned to this connection.
    fn client_id(&self) -> &MemberId;

    /// Subscribes to a room. Resolves once the relay accepted the subscription.
    async fn join_room(&self, room: &RoomName) -> Result<Self::Room>;
}

/// Subscription to a single room. Dropping it leaves the room.
#[async_trait]
pub trait RelayRoom: Send + Sync {
    fn name(&self) -> &RoomName;

    /// First membership snapshot observed after joining.
    ///
    /// Later membership notifications from the relay are ignored, so repeated
    /// calls return the same snapshot.
    async fn members(&mut self) -> Result<Vec<MemberId>>;

    /// Best-effort publish to every subscriber of the room, including this one.
    async fn publish(&self, payload: Value);

    /// Next message published to the room, `None` once the subscription ended.
    ///
    /// Must be cancel-safe: it is polled inside `tokio::select!`.
    async fn next_message(&mut self) -> Option<RelayMessage>;
}
