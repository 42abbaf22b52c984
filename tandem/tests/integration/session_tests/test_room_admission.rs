use std::time::Duration;

use tandem::{
    LocalRelay, RelayRoom, SessionConfig, SessionError, SignalingRelay, establish_session,
};

use crate::integration::init_tracing;
use crate::utils::SimFactory;

#[tokio::test]
async fn test_third_member_is_turned_away() {
    init_tracing();

    let relay = LocalRelay::new();
    let config = SessionConfig::default();
    let room = config.room_name("crowded");

    let first = relay.connect().await.unwrap();
    let second = relay.connect().await.unwrap();
    let mut first_room = first.join_room(&room).await.unwrap();
    let _second_room = second.join_room(&room).await.unwrap();

    let third = relay.connect().await.unwrap();
    let factory = SimFactory::new("third");
    let result = establish_session(&third, "crowded", &config, &factory).await;

    assert!(matches!(
        result,
        Err(SessionError::UnexpectedRoomSize { size: 3 })
    ));
    assert!(!factory.log().lock().await.created);

    // Nothing was published to the members already there.
    let published = tokio::time::timeout(Duration::from_millis(100), first_room.next_message()).await;
    assert!(published.is_err());

    // The rejected member left again.
    assert_eq!(relay.room_members(&room).len(), 2);
}

#[tokio::test]
async fn test_empty_room_name_is_rejected() {
    init_tracing();

    let relay = LocalRelay::new();
    let client = relay.connect().await.unwrap();

    let result = establish_session(&client, "", &SessionConfig::default(), &SimFactory::new("x")).await;

    assert!(matches!(result, Err(SessionError::RoomJoin { .. })));
}

#[tokio::test]
async fn test_closed_relay_rejects_the_join() {
    init_tracing();

    let relay = LocalRelay::new();
    let client = relay.connect().await.unwrap();
    relay.close();

    let result =
        establish_session(&client, "late", &SessionConfig::default(), &SimFactory::new("x")).await;

    assert!(matches!(result, Err(SessionError::RoomJoin { .. })));
    assert!(matches!(
        relay.connect().await,
        Err(SessionError::RelayConnect(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_lonely_member_times_out() {
    init_tracing();

    let relay = LocalRelay::new();
    let client = relay.connect().await.unwrap();
    let config = SessionConfig::default().with_negotiation_timeout(Duration::from_secs(2));
    let factory = SimFactory::new("alone");

    let result = establish_session(&client, "lonely", &config, &factory).await;

    assert!(matches!(
        result,
        Err(SessionError::NegotiationTimeout(t)) if t == Duration::from_secs(2)
    ));
    assert!(factory.log().lock().await.closed);
    assert!(relay.room_members(&config.room_name("lonely")).is_empty());
}
