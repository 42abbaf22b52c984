use crate::error::{Result, SessionError};
use crate::relay::room_inbox::{RoomEvent, RoomInbox};
use crate::relay::{RelayMessage, RelayRoom, SignalingRelay};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tandem_core::{MemberId, RelayFrame, RoomName};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

type RoomRoutes = Arc<DashMap<RoomName, mpsc::UnboundedSender<RoomEvent>>>;

/// Client for a WebSocket room relay speaking [`RelayFrame`]s.
///
/// A reader task routes incoming frames to the matching room subscription
/// and a writer task drains outgoing frames, so room handles never touch the
/// socket directly.
pub struct WsRelay {
    client_id: MemberId,
    outgoing: mpsc::UnboundedSender<RelayFrame>,
    rooms: RoomRoutes,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl WsRelay {
    /// Opens the socket and waits for the relay to assign a client id.
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to relay: {}", url);

        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| SessionError::RelayConnect(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        let client_id = loop {
            let frame = match read.next().await {
                Some(Ok(Message::Text(text))) => serde_json::from_str::<RelayFrame>(text.as_str())
                    .map_err(|e| SessionError::RelayConnect(format!("invalid relay frame: {e}")))?,
                Some(Ok(Message::Close(_))) | None => {
                    return Err(SessionError::RelayConnect(
                        "relay closed the connection during handshake".to_owned(),
                    ));
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(SessionError::RelayConnect(e.to_string())),
            };

            match frame {
                RelayFrame::Welcome { client_id } => break client_id,
                RelayFrame::Error { reason, .. } => return Err(SessionError::RelayConnect(reason)),
                other => debug!("Ignoring frame before welcome: {:?}", other),
            }
        };

        info!("Connected to {} as {}", url, client_id);

        let rooms: RoomRoutes = Arc::new(DashMap::new());
        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<RelayFrame>();

        let writer = tokio::spawn(async move {
            while let Some(frame) = outgoing_rx.recv().await {
                let json = match serde_json::to_string(&frame) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize relay frame: {}", e);
                        continue;
                    }
                };
                if write.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            let _ = write.close().await;
        });

        let reader = tokio::spawn({
            let rooms = rooms.clone();
            async move {
                while let Some(msg) = read.next().await {
                    match msg {
                        Ok(Message::Text(text)) => {
                            match serde_json::from_str::<RelayFrame>(text.as_str()) {
                                Ok(frame) => route_frame(&rooms, frame),
                                Err(e) => warn!("Invalid relay frame: {}", e),
                            }
                        }
                        Ok(Message::Close(_)) => break,
                        Ok(_) => {}
                        Err(e) => {
                            error!("Relay socket error: {}", e);
                            break;
                        }
                    }
                }
                warn!("Relay connection closed");
                // Dropping the senders ends every open room subscription.
                rooms.clear();
            }
        });

        Ok(Self {
            client_id,
            outgoing,
            rooms,
            reader,
            writer,
        })
    }
}

fn route_frame(rooms: &RoomRoutes, frame: RelayFrame) {
    let (room, event) = match frame {
        RelayFrame::Members { room, members } => (room, RoomEvent::Members(members)),
        RelayFrame::Message {
            room,
            client_id,
            message,
        } => (
            room,
            RoomEvent::Message(RelayMessage {
                sender: client_id,
                payload: message,
            }),
        ),
        RelayFrame::Error {
            room: Some(room),
            reason,
        } => (room, RoomEvent::Error(reason)),
        RelayFrame::Error { room: None, reason } => {
            warn!("Relay error: {}", reason);
            return;
        }
        other => {
            debug!("Ignoring unexpected relay frame: {:?}", other);
            return;
        }
    };

    match rooms.get(&room) {
        Some(tx) => {
            let _ = tx.send(event);
        }
        None => debug!("Dropping frame for unsubscribed room {}", room),
    }
}

#[async_trait]
impl SignalingRelay for WsRelay {
    type Room = WsRoom;

    fn client_id(&self) -> &MemberId {
        &self.client_id
    }

    async fn join_room(&self, room: &RoomName) -> Result<WsRoom> {
        let (tx, rx) = mpsc::unbounded_channel();
        match self.rooms.entry(room.clone()) {
            Entry::Occupied(_) => {
                return Err(SessionError::room_join(
                    room,
                    "room is already joined on this relay connection",
                ));
            }
            Entry::Vacant(slot) => {
                slot.insert(tx);
            }
        }
        let pending = PendingJoin {
            room,
            rooms: &self.rooms,
            outgoing: &self.outgoing,
            completed: false,
        };

        if self
            .outgoing
            .send(RelayFrame::Subscribe { room: room.clone() })
            .is_err()
        {
            return Err(SessionError::room_join(room, "relay connection is closed"));
        }

        let mut inbox = RoomInbox::new(rx);
        inbox.snapshot(room).await?;
        pending.complete();
        info!("Joined relay room {}", room);

        Ok(WsRoom {
            room: room.clone(),
            rooms: self.rooms.clone(),
            outgoing: self.outgoing.clone(),
            inbox,
        })
    }
}

/// Route and subscription of a join that has not produced a [`WsRoom`] yet.
///
/// Dropped without [`complete`](Self::complete), on error or when the join
/// future is cancelled, it removes the route and leaves the room.
struct PendingJoin<'a> {
    room: &'a RoomName,
    rooms: &'a RoomRoutes,
    outgoing: &'a mpsc::UnboundedSender<RelayFrame>,
    completed: bool,
}

impl PendingJoin<'_> {
    fn complete(mut self) {
        self.completed = true;
    }
}

impl Drop for PendingJoin<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        debug!("Abandoning join of relay room {}", self.room);
        self.rooms.remove(self.room);
        let _ = self.outgoing.send(RelayFrame::Unsubscribe {
            room: self.room.clone(),
        });
    }
}

impl Drop for WsRelay {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
        // Room handles may outlive the relay; their subscriptions end with it.
        self.rooms.clear();
    }
}

pub struct WsRoom {
    room: RoomName,
    rooms: RoomRoutes,
    outgoing: mpsc::UnboundedSender<RelayFrame>,
    inbox: RoomInbox,
}

#[async_trait]
impl RelayRoom for WsRoom {
    fn name(&self) -> &RoomName {
        &self.room
    }

    async fn members(&mut self) -> Result<Vec<MemberId>> {
        self.inbox.snapshot(&self.room).await
    }

    async fn publish(&self, payload: Value) {
        let frame = RelayFrame::Publish {
            room: self.room.clone(),
            message: payload,
        };
        if self.outgoing.send(frame).is_err() {
            warn!("Publish to {} dropped: relay connection is closed", self.room);
        }
    }

    async fn next_message(&mut self) -> Option<RelayMessage> {
        self.inbox.next_message(&self.room).await
    }
}

impl Drop for WsRoom {
    fn drop(&mut self) {
        self.rooms.remove(&self.room);
        let _ = self.outgoing.send(RelayFrame::Unsubscribe {
            room: self.room.clone(),
        });
    }
}
