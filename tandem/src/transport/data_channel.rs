use anyhow::{Result, bail};
use bytes::Bytes;
use futures::Stream;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_state::RTCDataChannelState;
use webrtc::peer_connection::RTCPeerConnection;

/// An open, bidirectional data channel to the remote member.
///
/// Owns the peer connection, so the channel stays usable after the session
/// that produced it is gone. Messages arriving before the first `recv` are
/// buffered, up to 1024 of them; further messages are dropped with a warning
/// until the reader catches up.
pub struct DataChannel {
    channel: Arc<RTCDataChannel>,
    peer_connection: Arc<RTCPeerConnection>,
    inbox: mpsc::Receiver<Bytes>,
}

impl DataChannel {
    pub(crate) fn new(
        channel: Arc<RTCDataChannel>,
        peer_connection: Arc<RTCPeerConnection>,
        inbox: mpsc::Receiver<Bytes>,
    ) -> Self {
        Self {
            channel,
            peer_connection,
            inbox,
        }
    }

    pub fn label(&self) -> &str {
        self.channel.label()
    }

    pub fn is_open(&self) -> bool {
        self.channel.ready_state() == RTCDataChannelState::Open
    }

    pub async fn send(&self, data: &[u8]) -> Result<()> {
        if !self.is_open() {
            bail!("data channel '{}' is not open", self.label());
        }
        self.channel.send(&Bytes::copy_from_slice(data)).await?;
        Ok(())
    }

    pub async fn send_text(&self, text: &str) -> Result<()> {
        if !self.is_open() {
            bail!("data channel '{}' is not open", self.label());
        }
        self.channel.send_text(text.to_owned()).await?;
        Ok(())
    }

    /// Next message from the remote member, or `None` once the channel closed.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.inbox.recv().await
    }

    pub fn into_stream(self) -> impl Stream<Item = Bytes> + Send {
        futures::stream::unfold(self, |mut channel| async move {
            let data = channel.recv().await?;
            Some((data, channel))
        })
    }

    /// Closes the channel and the underlying peer connection.
    pub async fn close(&self) -> Result<()> {
        self.channel.close().await?;
        self.peer_connection.close().await?;
        Ok(())
    }
}

impl fmt::Debug for DataChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataChannel")
            .field("label", &self.label())
            .field("state", &self.channel.ready_state())
            .finish()
    }
}
