use serde_json::json;
use tandem::{NegotiationState, RelayMessage, Role, SessionDescription, SignalMessage};

use crate::integration::{create_negotiator, init_tracing, local_id, relay_message};
use crate::utils::{SimBehavior, host_candidate};

#[tokio::test]
async fn test_own_messages_never_reach_the_peer() {
    init_tracing();

    let (mut negotiator, probe, log) =
        create_negotiator(Role::Responder, SimBehavior::default()).await;
    negotiator.start().await.unwrap();

    let own = [
        SignalMessage::Description(SessionDescription::offer("v=0 echoed")),
        SignalMessage::Candidate(host_candidate("self", 1)),
    ];
    for message in &own {
        negotiator
            .handle_relay_message(relay_message(&local_id(), message))
            .await
            .unwrap();
    }

    // Dropped before decoding, so this is not a protocol error.
    negotiator
        .handle_relay_message(RelayMessage {
            sender: local_id(),
            payload: json!({ "garbage": true }),
        })
        .await
        .unwrap();

    assert_eq!(negotiator.state(), NegotiationState::AwaitingRemoteDescription);
    assert!(negotiator.remote_description().is_none());
    assert_eq!(negotiator.pending_remote_candidates(), 0);

    let log = log.lock().await;
    assert!(log.remote_descriptions.is_empty());
    assert!(log.remote_candidates.is_empty());
    assert!(probe.published().await.is_empty());
}
