mod local_relay;
mod relay_transport;
mod room_inbox;
mod ws_relay;

pub use local_relay::{LocalRelay, LocalRelayClient, LocalRoom};
pub use relay_transport::{RelayMessage, RelayRoom, SignalingRelay};
pub use ws_relay::{WsRelay, WsRoom};
