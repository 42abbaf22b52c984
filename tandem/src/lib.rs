//! Two-party data channel negotiation over a room relay.
//!
//! The first process to join a room becomes the [`Role::Responder`], the
//! second one the [`Role::Initiator`]. Both run a [`Negotiator`] that trades
//! session descriptions and candidates through the relay until the data
//! channel opens, and then hand back a [`Session`].

mod error;
mod negotiation;
mod relay;
mod role;
mod session;
mod transport;

pub use error::{Result, SessionError};
pub use negotiation::{DEFAULT_NEGOTIATION_TIMEOUT, Latch, NegotiationState, Negotiator};
pub use relay::{
    LocalRelay, LocalRelayClient, LocalRoom, RelayMessage, RelayRoom, SignalingRelay, WsRelay,
    WsRoom,
};
pub use role::resolve_role;
pub use session::{Session, SessionConfig, connect_to_room, establish_session};
pub use transport::{
    DataChannel, PeerEvent, PeerFactory, PeerTransport, TransportConfig, WebRtcFactory,
    WebRtcPeer,
};

pub use tandem_core::{
    IceCandidate, IceServerConfig, MemberId, Role, RoomName, SdpType, SessionDescription,
    SignalMessage,
};
