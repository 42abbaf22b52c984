use crate::error::{Result, SessionError};
use crate::relay::RelayMessage;
use std::collections::VecDeque;
use tandem_core::{MemberId, RoomName};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Events a relay connection routes to one room subscription.
#[derive(Debug)]
pub(crate) enum RoomEvent {
    Members(Vec<MemberId>),
    Message(RelayMessage),
    Error(String),
}

/// Receiving half of a room subscription shared by the relay adapters.
///
/// Keeps the first membership snapshot and holds back messages that arrive
/// while the snapshot is still awaited.
pub(crate) struct RoomInbox {
    events: mpsc::UnboundedReceiver<RoomEvent>,
    snapshot: Option<Vec<MemberId>>,
    backlog: VecDeque<RelayMessage>,
}

impl RoomInbox {
    pub(crate) fn new(events: mpsc::UnboundedReceiver<RoomEvent>) -> Self {
        Self {
            events,
            snapshot: None,
            backlog: VecDeque::new(),
        }
    }

    pub(crate) async fn snapshot(&mut self, room: &RoomName) -> Result<Vec<MemberId>> {
        if let Some(members) = &self.snapshot {
            return Ok(members.clone());
        }

        while let Some(event) = self.events.recv().await {
            match event {
                RoomEvent::Members(members) => {
                    self.snapshot = Some(members.clone());
                    return Ok(members);
                }
                RoomEvent::Message(message) => self.backlog.push_back(message),
                RoomEvent::Error(reason) => return Err(SessionError::room_join(room, reason)),
            }
        }

        Err(SessionError::room_join(
            room,
            "relay ended the subscription before reporting members",
        ))
    }

    pub(crate) async fn next_message(&mut self, room: &RoomName) -> Option<RelayMessage> {
        if let Some(message) = self.backlog.pop_front() {
            return Some(message);
        }

        loop {
            match self.events.recv().await? {
                RoomEvent::Message(message) => return Some(message),
                RoomEvent::Members(members) => {
                    debug!(
                        "Ignoring membership update for {} ({} members)",
                        room,
                        members.len()
                    );
                }
                RoomEvent::Error(reason) => warn!("Relay reported error for {}: {}", room, reason),
            }
        }
    }
}
