use crate::error::{Result, SessionError};
use crate::negotiation::Negotiator;
use crate::relay::{RelayRoom, SignalingRelay, WsRelay};
use crate::role::resolve_role;
use crate::session::{Session, SessionConfig};
use crate::transport::{DataChannel, PeerFactory, PeerTransport, WebRtcFactory};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const PEER_EVENT_BUFFER: usize = 256;

type ChannelOf<F> = <<F as PeerFactory>::Peer as PeerTransport>::Channel;

/// Joins `room` on `relay`, negotiates with the other member and returns the open session.
///
/// The whole sequence, from joining to the channel opening, is bounded by
/// [`SessionConfig::negotiation_timeout`]. Dropping the returned future
/// leaves the room and drops the peer transport.
pub async fn establish_session<S, F>(
    relay: &S,
    room: &str,
    config: &SessionConfig,
    factory: &F,
) -> Result<Session<ChannelOf<F>>>
where
    S: SignalingRelay,
    F: PeerFactory,
{
    let deadline = Instant::now() + config.negotiation_timeout();
    establish_until(relay, room, config, factory, deadline).await
}

async fn establish_until<S, F>(
    relay: &S,
    room: &str,
    config: &SessionConfig,
    factory: &F,
    deadline: Instant,
) -> Result<Session<ChannelOf<F>>>
where
    S: SignalingRelay,
    F: PeerFactory,
{
    if room.is_empty() {
        return Err(SessionError::room_join(room, "room name must not be empty"));
    }

    let room_name = config.room_name(room);
    let timeout = config.negotiation_timeout();

    info!("Establishing session in room {}", room_name);

    let joined = tokio::time::timeout_at(deadline, async {
        let mut handle = relay.join_room(&room_name).await?;
        let members = handle.members().await?;
        debug!("Room {} has {} members", room_name, members.len());

        let role = resolve_role(&members)?;
        Ok::<_, SessionError>((handle, role))
    })
    .await;

    let (handle, role) = match joined {
        Ok(joined) => joined?,
        Err(_) => return Err(SessionError::NegotiationTimeout(timeout)),
    };
    info!("Joined {} as {}", handle.name(), role);

    let (events_tx, events_rx) = mpsc::channel(PEER_EVENT_BUFFER);
    let peer = factory
        .create(&config.transport, events_tx)
        .await
        .map_err(|e| {
            SessionError::PeerTransport(format!("failed to create peer transport: {e:#}"))
        })?;

    Negotiator::new(role, relay.client_id().clone(), peer, handle, events_rx)
        .with_channel_label(config.channel_label.clone())
        .with_timeout(timeout)
        .run_until(deadline)
        .await
}

/// Connects to a WebSocket relay and establishes a WebRTC data channel session in `room`.
///
/// The negotiation timeout also bounds the relay handshake: a relay that
/// accepts the socket but never greets fails with
/// [`SessionError::NegotiationTimeout`].
pub async fn connect_to_room(
    relay_url: &str,
    room: &str,
    config: &SessionConfig,
) -> Result<Session<DataChannel>> {
    let timeout = config.negotiation_timeout();
    let deadline = Instant::now() + timeout;

    let relay = match tokio::time::timeout_at(deadline, WsRelay::connect(relay_url)).await {
        Ok(relay) => relay?,
        Err(_) => {
            warn!("Relay {} did not complete the handshake in time", relay_url);
            return Err(SessionError::NegotiationTimeout(timeout));
        }
    };
    establish_until(&relay, room, config, &WebRtcFactory, deadline).await
}
