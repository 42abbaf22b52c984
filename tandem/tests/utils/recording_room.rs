use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tandem::{MemberId, RelayMessage, RelayRoom, RoomName, SessionDescription, SignalMessage};
use tokio::sync::{Mutex, mpsc};

/// A [`RelayRoom`] fed by hand through its [`RoomProbe`].
///
/// Publishes are recorded instead of delivered anywhere.
pub struct RecordingRoom {
    name: RoomName,
    members: Vec<MemberId>,
    inbox: mpsc::UnboundedReceiver<RelayMessage>,
    published: Arc<Mutex<Vec<Value>>>,
}

/// Test-side handle of a [`RecordingRoom`].
pub struct RoomProbe {
    tx: Option<mpsc::UnboundedSender<RelayMessage>>,
    published: Arc<Mutex<Vec<Value>>>,
}

impl RecordingRoom {
    pub fn new(name: &str, members: Vec<MemberId>) -> (Self, RoomProbe) {
        let (tx, inbox) = mpsc::unbounded_channel();
        let published = Arc::new(Mutex::new(Vec::new()));

        let room = Self {
            name: RoomName::new(name),
            members,
            inbox,
            published: published.clone(),
        };
        let probe = RoomProbe {
            tx: Some(tx),
            published,
        };
        (room, probe)
    }
}

#[async_trait]
impl RelayRoom for RecordingRoom {
    fn name(&self) -> &RoomName {
        &self.name
    }

    async fn members(&mut self) -> tandem::Result<Vec<MemberId>> {
        Ok(self.members.clone())
    }

    async fn publish(&self, payload: Value) {
        tracing::debug!("[RecordingRoom] publish {}", payload);
        self.published.lock().await.push(payload);
    }

    async fn next_message(&mut self) -> Option<RelayMessage> {
        self.inbox.recv().await
    }
}

impl RoomProbe {
    /// Delivers a signaling message as if `sender` had published it.
    pub fn deliver(&self, sender: &MemberId, message: &SignalMessage) {
        let payload = serde_json::to_value(message).expect("signal message encodes");
        self.deliver_raw(sender, payload);
    }

    pub fn deliver_raw(&self, sender: &MemberId, payload: Value) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(RelayMessage {
                sender: sender.clone(),
                payload,
            });
        }
    }

    /// Ends the subscription; the room reports no further messages.
    pub fn close(&mut self) {
        self.tx = None;
    }

    pub async fn published(&self) -> Vec<SignalMessage> {
        self.published
            .lock()
            .await
            .iter()
            .map(|v| serde_json::from_value(v.clone()).expect("published payload decodes"))
            .collect()
    }

    pub async fn published_descriptions(&self) -> Vec<SessionDescription> {
        self.published()
            .await
            .into_iter()
            .filter_map(|m| match m {
                SignalMessage::Description(d) => Some(d),
                SignalMessage::Candidate(_) => None,
            })
            .collect()
    }

    pub async fn published_candidate_count(&self) -> usize {
        self.published()
            .await
            .iter()
            .filter(|m| matches!(m, SignalMessage::Candidate(_)))
            .count()
    }
}
