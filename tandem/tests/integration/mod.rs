//! Integration tests for tandem.
//!
//! Tests are organized by functionality:
//! - `negotiation_tests` - the state machine stepped by hand
//! - `session_tests` - whole sessions over the in-process relay
//! - `relay_tests` - the WebSocket relay client against a mock relay
//! - `webrtc_tests` - real peer connections exchanging data


use std::time::Duration;

use tandem::{LocalRelay, MemberId, Negotiator, RelayMessage, Role, RoomName, SignalMessage};
use tokio::sync::mpsc;
use tracing::Level;

use crate::utils::{RecordingRoom, RoomProbe, SharedLog, SimBehavior, SimulatedPeer};

/// Initialize tracing for tests (call once per test).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn local_id() -> MemberId {
    MemberId::new("self")
}

pub fn remote_id() -> MemberId {
    MemberId::new("peer")
}

/// Wraps `message` as if the relay delivered it from `sender`.
pub fn relay_message(sender: &MemberId, message: &SignalMessage) -> RelayMessage {
    RelayMessage {
        sender: sender.clone(),
        payload: serde_json::to_value(message).expect("signal message encodes"),
    }
}

/// A negotiator over a hand-fed room and a simulated peer.
///
/// Returns (negotiator, room probe, peer log) for test control.
pub async fn create_negotiator(
    role: Role,
    behavior: SimBehavior,
) -> (Negotiator<SimulatedPeer, RecordingRoom>, RoomProbe, SharedLog) {
    let members = match role {
        Role::Responder => vec![local_id()],
        Role::Initiator => vec![remote_id(), local_id()],
    };
    let (room, probe) = RecordingRoom::new("tandem-test", members);

    let (events_tx, events_rx) = mpsc::channel(64);
    let log = SharedLog::default();
    let peer = SimulatedPeer::new("self", behavior, log.clone(), events_tx).await;

    let negotiator = Negotiator::new(role, local_id(), peer, room, events_rx);
    (negotiator, probe, log)
}

/// Polls until `room` on the local relay has `count` subscribers.
pub async fn wait_for_local_members(relay: &LocalRelay, room: &RoomName, count: usize) {
    for _ in 0..500 {
        if relay.room_members(room).len() == count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("room {room} never reached {count} members");
}
