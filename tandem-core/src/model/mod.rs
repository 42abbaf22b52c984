mod member;
mod relay_frame;
mod role;
mod room;
mod signaling;

pub use member::MemberId;
pub use relay_frame::RelayFrame;
pub use role::Role;
pub use room::{DEFAULT_ROOM_PREFIX, RoomName};
pub use signaling::{
    DEFAULT_STUN_ADDR, IceCandidate, IceServerConfig, SdpType, SessionDescription, SignalMessage,
};
