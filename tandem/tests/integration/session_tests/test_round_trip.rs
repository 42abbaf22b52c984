use tandem::{LocalRelay, Role, SdpType, SessionConfig, SignalingRelay, establish_session};

use crate::integration::{init_tracing, wait_for_local_members};
use crate::utils::SimFactory;

#[tokio::test]
async fn test_offer_answer_round_trip() {
    init_tracing();

    let relay = LocalRelay::new();
    let config = SessionConfig::default();
    let room = config.room_name("round-trip");

    let first = relay.connect().await.unwrap();
    let first_factory = SimFactory::new("first");
    let first_log = first_factory.log();
    let first_task = tokio::spawn({
        let config = config.clone();
        async move { establish_session(&first, "round-trip", &config, &first_factory).await }
    });

    wait_for_local_members(&relay, &room, 1).await;

    let second = relay.connect().await.unwrap();
    let second_id = second.client_id().clone();
    let second_factory = SimFactory::new("second");
    let second_log = second_factory.log();
    let second_session = establish_session(&second, "round-trip", &config, &second_factory)
        .await
        .unwrap();
    let first_session = first_task.await.unwrap().unwrap();

    assert_eq!(first_session.role(), Role::Responder);
    assert_eq!(second_session.role(), Role::Initiator);
    assert!(second_session.is_initiator());
    assert_eq!(first_session.channel().label, "data");
    assert_eq!(second_session.channel().label, "data");
    assert!(!second_id.as_str().is_empty());

    let first_log = first_log.lock().await;
    let second_log = second_log.lock().await;
    assert_eq!(second_log.local_descriptions[0].kind, SdpType::Offer);
    assert_eq!(first_log.remote_descriptions, second_log.local_descriptions);
    assert_eq!(first_log.local_descriptions[0].kind, SdpType::Answer);
    assert_eq!(second_log.remote_descriptions, first_log.local_descriptions);
    assert!(first_log.data_channels.is_empty());
    assert_eq!(second_log.data_channels, vec!["data".to_owned()]);
}
