use crate::error::{Result, SessionError};
use crate::relay::room_inbox::{RoomEvent, RoomInbox};
use crate::relay::{RelayMessage, RelayRoom, SignalingRelay};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tandem_core::{MemberId, RoomName};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

struct Subscriber {
    id: MemberId,
    tx: mpsc::UnboundedSender<RoomEvent>,
}

#[derive(Default)]
struct Hub {
    rooms: DashMap<RoomName, Vec<Subscriber>>,
    closed: AtomicBool,
}

/// In-process relay with the same room semantics as a hosted pub/sub relay.
///
/// Every client gets a random identity, publishes are echoed to all room
/// subscribers including the publisher, and each subscription sees exactly
/// one membership snapshot taken at join time.
#[derive(Clone, Default)]
pub struct LocalRelay {
    hub: Arc<Hub>,
}

impl LocalRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn connect(&self) -> Result<LocalRelayClient> {
        if self.hub.closed.load(Ordering::Acquire) {
            return Err(SessionError::RelayConnect("relay is closed".to_owned()));
        }

        let client_id = MemberId::random();
        debug!("Local relay client connected: {}", client_id);

        Ok(LocalRelayClient {
            hub: self.hub.clone(),
            client_id,
        })
    }

    /// Current subscribers of a room, in join order.
    pub fn room_members(&self, room: &RoomName) -> Vec<MemberId> {
        self.hub
            .rooms
            .get(room)
            .map(|subscribers| subscribers.iter().map(|s| s.id.clone()).collect())
            .unwrap_or_default()
    }

    /// Shuts the relay down. Open subscriptions end and new connections fail.
    pub fn close(&self) {
        info!("Closing local relay");
        self.hub.closed.store(true, Ordering::Release);
        self.hub.rooms.clear();
    }
}

pub struct LocalRelayClient {
    hub: Arc<Hub>,
    client_id: MemberId,
}

#[async_trait]
impl SignalingRelay for LocalRelayClient {
    type Room = LocalRoom;

    fn client_id(&self) -> &MemberId {
        &self.client_id
    }

    async fn join_room(&self, room: &RoomName) -> Result<LocalRoom> {
        if self.hub.closed.load(Ordering::Acquire) {
            return Err(SessionError::room_join(room, "relay is closed"));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut subscribers = self.hub.rooms.entry(room.clone()).or_default();
            subscribers.retain(|s| s.id != self.client_id);
            subscribers.push(Subscriber {
                id: self.client_id.clone(),
                tx: tx.clone(),
            });
            let snapshot = subscribers.iter().map(|s| s.id.clone()).collect();
            let _ = tx.send(RoomEvent::Members(snapshot));
        }

        let mut inbox = RoomInbox::new(rx);
        inbox.snapshot(room).await?;
        info!("Client {} joined local room {}", self.client_id, room);

        Ok(LocalRoom {
            hub: self.hub.clone(),
            room: room.clone(),
            client_id: self.client_id.clone(),
            inbox,
        })
    }
}

pub struct LocalRoom {
    hub: Arc<Hub>,
    room: RoomName,
    client_id: MemberId,
    inbox: RoomInbox,
}

#[async_trait]
impl RelayRoom for LocalRoom {
    fn name(&self) -> &RoomName {
        &self.room
    }

    async fn members(&mut self) -> Result<Vec<MemberId>> {
        self.inbox.snapshot(&self.room).await
    }

    async fn publish(&self, payload: Value) {
        let Some(subscribers) = self.hub.rooms.get(&self.room) else {
            warn!("Publish to {} dropped: room no longer exists", self.room);
            return;
        };

        for subscriber in subscribers.iter() {
            let message = RelayMessage {
                sender: self.client_id.clone(),
                payload: payload.clone(),
            };
            if subscriber.tx.send(RoomEvent::Message(message)).is_err() {
                debug!("Subscriber {} of {} is gone", subscriber.id, self.room);
            }
        }
    }

    async fn next_message(&mut self) -> Option<RelayMessage> {
        self.inbox.next_message(&self.room).await
    }
}

impl Drop for LocalRoom {
    fn drop(&mut self) {
        if let Some(mut subscribers) = self.hub.rooms.get_mut(&self.room) {
            subscribers.retain(|s| s.id != self.client_id);
        }
        self.hub
            .rooms
            .remove_if(&self.room, |_, subscribers| subscribers.is_empty());
        debug!("Client {} left local room {}", self.client_id, self.room);
    }
}
