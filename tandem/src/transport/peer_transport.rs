use crate::transport::{PeerEvent, TransportConfig};
use anyhow::Result;
use async_trait::async_trait;
use tandem_core::{IceCandidate, SessionDescription};
use tokio::sync::mpsc;

/// The peer-connection primitives the negotiator drives.
///
/// Asynchronous happenings (gathered candidates, channel announcements, the
/// channel opening) are not returned from these calls but reported as
/// [`PeerEvent`]s on the channel the transport was created with.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// The message conduit handed to the caller once negotiation completes.
    type Channel: Send + Sync + 'static;

    /// Requests the outgoing data channel. Reports `NegotiationNeeded` afterwards.
    async fn create_data_channel(&self, label: &str) -> Result<()>;

    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, description: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Builds a fresh peer transport for one negotiation.
#[async_trait]
pub trait PeerFactory: Send + Sync {
    type Peer: PeerTransport;

    async fn create(
        &self,
        config: &TransportConfig,
        events: mpsc::Sender<PeerEvent<<Self::Peer as PeerTransport>::Channel>>,
    ) -> Result<Self::Peer>;
}
