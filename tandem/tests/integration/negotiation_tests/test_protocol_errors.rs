use serde_json::json;
use tandem::{
    NegotiationState, PeerEvent, RelayMessage, Role, SdpType, SessionDescription, SessionError,
    SignalMessage,
};

use crate::integration::{create_negotiator, init_tracing, relay_message, remote_id};
use crate::utils::SimBehavior;

fn offer() -> SignalMessage {
    SignalMessage::Description(SessionDescription::offer("v=0 a=label:data"))
}

fn answer() -> SignalMessage {
    SignalMessage::Description(SessionDescription::answer("v=0 s=peer"))
}

#[tokio::test]
async fn test_offer_at_initiator_is_rejected() {
    init_tracing();

    let (mut negotiator, _probe, _log) =
        create_negotiator(Role::Initiator, SimBehavior::default()).await;
    negotiator.start().await.unwrap();
    negotiator
        .handle_peer_event(PeerEvent::NegotiationNeeded)
        .await
        .unwrap();

    let result = negotiator
        .handle_relay_message(relay_message(&remote_id(), &offer()))
        .await;

    assert!(matches!(result, Err(SessionError::SignalingProtocol(_))));
    assert_eq!(negotiator.state(), NegotiationState::Failed);
}

#[tokio::test]
async fn test_answer_at_responder_is_rejected() {
    init_tracing();

    let (mut negotiator, _probe, _log) =
        create_negotiator(Role::Responder, SimBehavior::default()).await;
    negotiator.start().await.unwrap();

    let result = negotiator
        .handle_relay_message(relay_message(&remote_id(), &answer()))
        .await;

    assert!(matches!(result, Err(SessionError::SignalingProtocol(_))));
    assert_eq!(negotiator.state(), NegotiationState::Failed);
}

#[tokio::test]
async fn test_answer_before_offer_is_rejected() {
    init_tracing();

    let (mut negotiator, _probe, log) =
        create_negotiator(Role::Initiator, SimBehavior::default()).await;
    negotiator.start().await.unwrap();

    let result = negotiator
        .handle_relay_message(relay_message(&remote_id(), &answer()))
        .await;

    assert!(matches!(result, Err(SessionError::SignalingProtocol(_))));
    assert!(log.lock().await.remote_descriptions.is_empty());
}

#[tokio::test]
async fn test_undecodable_payload_is_rejected() {
    init_tracing();

    let (mut negotiator, _probe, _log) =
        create_negotiator(Role::Responder, SimBehavior::default()).await;
    negotiator.start().await.unwrap();

    let result = negotiator
        .handle_relay_message(RelayMessage {
            sender: remote_id(),
            payload: json!({ "sdp": { "type": "rollback", "sdp": "" } }),
        })
        .await;

    assert!(matches!(result, Err(SessionError::SignalingProtocol(_))));
    assert_eq!(negotiator.state(), NegotiationState::Failed);

    // Nothing is processed once failed.
    negotiator
        .handle_relay_message(relay_message(&remote_id(), &offer()))
        .await
        .unwrap();
    assert!(negotiator.remote_description().is_none());
}

#[tokio::test]
async fn test_rejected_remote_description_fails_negotiation() {
    init_tracing();

    let behavior = SimBehavior {
        reject_remote_description: true,
        ..SimBehavior::default()
    };
    let (mut negotiator, probe, _log) = create_negotiator(Role::Responder, behavior).await;
    negotiator.start().await.unwrap();

    let result = negotiator
        .handle_relay_message(relay_message(&remote_id(), &offer()))
        .await;

    match result {
        Err(SessionError::SignalingProtocol(reason)) => {
            assert!(reason.contains("remote description"), "{reason}")
        }
        other => panic!("expected SignalingProtocol, got {other:?}"),
    }
    assert!(probe.published().await.is_empty());
}

#[tokio::test]
async fn test_duplicate_offer_is_ignored() {
    init_tracing();

    let (mut negotiator, probe, log) =
        create_negotiator(Role::Responder, SimBehavior::default()).await;
    negotiator.start().await.unwrap();

    for _ in 0..2 {
        negotiator
            .handle_relay_message(relay_message(&remote_id(), &offer()))
            .await
            .unwrap();
    }

    assert_eq!(negotiator.state(), NegotiationState::Connecting);
    assert_eq!(log.lock().await.remote_descriptions.len(), 1);

    let published = probe.published_descriptions().await;
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].kind, SdpType::Answer);
}
