mod data_channel;
mod peer_transport;
mod transport_config;
mod transport_event;
mod webrtc_peer;

pub use data_channel::DataChannel;
pub use peer_transport::{PeerFactory, PeerTransport};
pub use transport_config::TransportConfig;
pub use transport_event::PeerEvent;
pub use webrtc_peer::{WebRtcFactory, WebRtcPeer};
