use crate::transport::{DataChannel, PeerEvent, PeerFactory, PeerTransport, TransportConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::{Arc, Weak};
use tandem_core::{IceCandidate, IceServerConfig, SdpType, SessionDescription};
use bytes::Bytes;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

/// [`PeerTransport`] backed by a `webrtc` peer connection.
pub struct WebRtcPeer {
    peer_connection: Arc<RTCPeerConnection>,
    events: mpsc::Sender<PeerEvent<DataChannel>>,
}

impl WebRtcPeer {
    /// Builds the peer connection and wires its callbacks into `events`.
    pub async fn new(
        config: &TransportConfig,
        events: mpsc::Sender<PeerEvent<DataChannel>>,
    ) -> Result<Self> {
        // Codecs are registered even though only a data channel is negotiated.
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config.ice_servers.iter().map(rtc_ice_server).collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        let state_tx = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    debug!("Peer connection state changed: {:?}", s);
                    if s == RTCPeerConnectionState::Failed {
                        let _ = tx
                            .send(PeerEvent::Failed("peer connection failed".to_owned()))
                            .await;
                    }
                })
            },
        ));

        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                // `None` marks the end of gathering.
                let Some(candidate) = c else { return };
                let gathered = candidate
                    .to_json()
                    .map_err(anyhow::Error::from)
                    .and_then(candidate_from_rtc);
                match gathered {
                    Ok(candidate) => {
                        let _ = tx.send(PeerEvent::CandidateGathered(candidate)).await;
                    }
                    Err(e) => warn!("Dropping unusable local candidate: {:#}", e),
                }
            })
        }));

        let dc_tx = events.clone();
        let pc_weak = Arc::downgrade(&peer_connection);
        peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let tx = dc_tx.clone();
            let pc = pc_weak.clone();

            Box::pin(async move {
                debug!("Remote announced data channel '{}'", dc.label());
                attach_channel(&dc, pc, tx.clone());
                let _ = tx
                    .send(PeerEvent::ChannelAnnounced(dc.label().to_owned()))
                    .await;
            })
        }));

        Ok(Self {
            peer_connection,
            events,
        })
    }
}

/// Messages held for a [`DataChannel`] that is not being read.
const INBOX_CAPACITY: usize = 1024;

/// Buffers incoming messages from creation on and reports the channel once it opens.
///
/// Only the first open event yields a [`DataChannel`]; the inbox can be handed out once.
fn attach_channel(
    channel: &Arc<RTCDataChannel>,
    peer_connection: Weak<RTCPeerConnection>,
    events: mpsc::Sender<PeerEvent<DataChannel>>,
) {
    let (inbox_tx, inbox_rx) = mpsc::channel(INBOX_CAPACITY);
    let label = channel.label().to_owned();
    channel.on_message(Box::new(move |msg: DataChannelMessage| {
        deliver(&inbox_tx, &label, msg.data);
        Box::pin(async {})
    }));

    let inbox = Arc::new(Mutex::new(Some(inbox_rx)));
    let channel_weak = Arc::downgrade(channel);
    channel.on_open(Box::new(move || {
        let tx = events.clone();
        let inbox = inbox.clone();
        let channel = channel_weak.clone();
        let pc = peer_connection.clone();

        Box::pin(async move {
            let (Some(channel), Some(pc)) = (channel.upgrade(), pc.upgrade()) else {
                return;
            };
            let Some(inbox) = inbox.lock().await.take() else {
                debug!("Data channel '{}' reported open again", channel.label());
                return;
            };

            info!("Data channel '{}' open", channel.label());
            let _ = tx
                .send(PeerEvent::ChannelOpen(DataChannel::new(channel, pc, inbox)))
                .await;
        })
    }));
}

/// Queues an incoming message, dropping it when the reader has fallen behind.
fn deliver(inbox: &mpsc::Sender<Bytes>, label: &str, data: Bytes) -> bool {
    match inbox.try_send(data) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!("Data channel '{}' inbox is full, dropping message", label);
            false
        }
        Err(TrySendError::Closed(_)) => false,
    }
}

#[async_trait]
impl PeerTransport for WebRtcPeer {
    type Channel = DataChannel;

    async fn create_data_channel(&self, label: &str) -> Result<()> {
        let channel = self
            .peer_connection
            .create_data_channel(label, None)
            .await
            .context("Failed to create data channel")?;

        attach_channel(
            &channel,
            Arc::downgrade(&self.peer_connection),
            self.events.clone(),
        );

        let _ = self.events.send(PeerEvent::NegotiationNeeded).await;
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .context("Failed to create offer")?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .context("Failed to create answer")?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        let desc = rtc_description(description)?;
        self.peer_connection
            .set_local_description(desc)
            .await
            .context("Failed to set local description")?;
        Ok(())
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        let desc = rtc_description(description)?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .context("Failed to set remote description")?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = candidate_to_rtc(candidate)?;
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Creates [`WebRtcPeer`]s for [`establish_session`](crate::establish_session).
#[derive(Debug, Clone, Copy, Default)]
pub struct WebRtcFactory;

#[async_trait]
impl PeerFactory for WebRtcFactory {
    type Peer = WebRtcPeer;

    async fn create(
        &self,
        config: &TransportConfig,
        events: mpsc::Sender<PeerEvent<DataChannel>>,
    ) -> Result<WebRtcPeer> {
        WebRtcPeer::new(config, events).await
    }
}

fn rtc_ice_server(server: &IceServerConfig) -> RTCIceServer {
    RTCIceServer {
        urls: server.urls.clone(),
        username: server.username.clone().unwrap_or_default(),
        credential: server.credential.clone().unwrap_or_default(),
        ..Default::default()
    }
}

fn rtc_description(description: SessionDescription) -> Result<RTCSessionDescription> {
    let desc = match description.kind {
        SdpType::Offer => RTCSessionDescription::offer(description.sdp),
        SdpType::Answer => RTCSessionDescription::answer(description.sdp),
    };
    desc.context("Malformed session description")
}

// Both candidate types share the browser JSON shape, so they convert through it.
fn candidate_to_rtc(candidate: IceCandidate) -> Result<RTCIceCandidateInit> {
    let json = serde_json::to_value(candidate)?;
    serde_json::from_value(json).context("Failed to convert ICE candidate")
}

fn candidate_from_rtc(init: RTCIceCandidateInit) -> Result<IceCandidate> {
    let json = serde_json::to_value(init)?;
    serde_json::from_value(json).context("Failed to convert ICE candidate")
}
