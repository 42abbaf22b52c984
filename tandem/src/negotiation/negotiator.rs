use crate::error::{Result, SessionError};
use crate::negotiation::{Latch, NegotiationState};
use crate::relay::{RelayMessage, RelayRoom};
use crate::session::Session;
use crate::transport::{PeerEvent, PeerTransport};
use std::time::Duration;
use tandem_core::{IceCandidate, MemberId, Role, SdpType, SessionDescription, SignalMessage};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub const DEFAULT_NEGOTIATION_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) const DEFAULT_CHANNEL_LABEL: &str = "data";

/// Drives one offer/answer exchange between this process and the other room member.
///
/// Owns the peer transport, the room subscription and the receiving end of
/// the transport's events. [`run`](Self::run) multiplexes relay messages and
/// peer events on a single task until the data channel opens, an error
/// occurs or the deadline passes. The `handle_*` methods are public so the
/// machine can also be stepped by hand.
pub struct Negotiator<P: PeerTransport, R: RelayRoom> {
    role: Role,
    local_id: MemberId,
    peer: P,
    room: R,
    events: mpsc::Receiver<PeerEvent<P::Channel>>,

    state: NegotiationState,
    channel_label: String,
    timeout: Duration,

    local_description: Option<SessionDescription>,
    remote_description: Option<SessionDescription>,
    /// Gathered before the local description was committed.
    pending_local: Vec<IceCandidate>,
    /// Received before the remote description was committed.
    pending_remote: Vec<IceCandidate>,

    channel: Latch<P::Channel>,
}

impl<P: PeerTransport, R: RelayRoom> Negotiator<P, R> {
    pub fn new(
        role: Role,
        local_id: MemberId,
        peer: P,
        room: R,
        events: mpsc::Receiver<PeerEvent<P::Channel>>,
    ) -> Self {
        Self {
            role,
            local_id,
            peer,
            room,
            events,
            state: NegotiationState::Idle,
            channel_label: DEFAULT_CHANNEL_LABEL.to_owned(),
            timeout: DEFAULT_NEGOTIATION_TIMEOUT,
            local_description: None,
            remote_description: None,
            pending_local: Vec::new(),
            pending_remote: Vec::new(),
            channel: Latch::new(),
        }
    }

    pub fn with_channel_label(mut self, label: impl Into<String>) -> Self {
        self.channel_label = label.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn local_description(&self) -> Option<&SessionDescription> {
        self.local_description.as_ref()
    }

    pub fn remote_description(&self) -> Option<&SessionDescription> {
        self.remote_description.as_ref()
    }

    pub fn pending_local_candidates(&self) -> usize {
        self.pending_local.len()
    }

    pub fn pending_remote_candidates(&self) -> usize {
        self.pending_remote.len()
    }

    pub fn is_channel_ready(&self) -> bool {
        self.channel.is_resolved()
    }

    /// Runs the exchange to completion within the configured timeout.
    pub async fn run(self) -> Result<Session<P::Channel>> {
        let deadline = Instant::now() + self.timeout;
        self.run_until(deadline).await
    }

    /// Like [`run`](Self::run), against a deadline that may already be partly spent.
    pub(crate) async fn run_until(mut self, deadline: Instant) -> Result<Session<P::Channel>> {
        info!("Negotiating as {} in room {}", self.role, self.room.name());

        match self.drive(deadline).await {
            Ok(channel) => {
                info!("Session ready as {} in room {}", self.role, self.room.name());
                Ok(Session::new(self.role, channel))
            }
            Err(e) => {
                self.state = NegotiationState::Failed;
                warn!("Negotiation in room {} failed: {}", self.room.name(), e);
                if let Err(close_err) = self.peer.close().await {
                    warn!("Failed to close peer transport: {:#}", close_err);
                }
                Err(e)
            }
        }
    }

    async fn drive(&mut self, deadline: Instant) -> Result<P::Channel> {
        self.start().await?;

        let sleep = tokio::time::sleep_until(deadline);
        tokio::pin!(sleep);

        loop {
            if let Some(channel) = self.channel.take() {
                return Ok(channel);
            }

            tokio::select! {
                _ = &mut sleep => {
                    return Err(SessionError::NegotiationTimeout(self.timeout));
                }

                msg = self.room.next_message() => match msg {
                    Some(m) => self.handle_relay_message(m).await?,
                    None => return Err(SessionError::RelayClosed),
                },

                evt = self.events.recv() => match evt {
                    Some(e) => self.handle_peer_event(e).await?,
                    None => {
                        return Err(SessionError::PeerTransport(
                            "peer transport stopped reporting events".to_owned(),
                        ));
                    }
                },
            }
        }
    }

    /// Leaves `Idle`. The initiator requests its data channel here.
    pub async fn start(&mut self) -> Result<()> {
        if self.state != NegotiationState::Idle {
            return Ok(());
        }

        let result = match self.role {
            Role::Initiator => {
                debug!("Creating data channel '{}'", self.channel_label);
                match self.peer.create_data_channel(&self.channel_label).await {
                    Ok(()) => {
                        self.state = NegotiationState::AwaitingLocalDescription;
                        Ok(())
                    }
                    Err(e) => Err(SessionError::PeerTransport(format!(
                        "failed to create data channel: {e:#}"
                    ))),
                }
            }
            Role::Responder => {
                self.state = NegotiationState::AwaitingRemoteDescription;
                Ok(())
            }
        };

        self.settle(result)
    }

    pub async fn handle_relay_message(&mut self, message: RelayMessage) -> Result<()> {
        if self.state.is_terminal() {
            return Ok(());
        }
        if message.sender == self.local_id {
            debug!("Skipping own message echoed by the relay");
            return Ok(());
        }

        let result = self.apply_relay_message(message).await;
        self.settle(result)
    }

    async fn apply_relay_message(&mut self, message: RelayMessage) -> Result<()> {
        let signal: SignalMessage =
            serde_json::from_value(message.payload).map_err(|e| {
                SessionError::SignalingProtocol(format!(
                    "undecodable payload from {}: {e}",
                    message.sender
                ))
            })?;
        debug!("Received {} from {}", signal.kind(), message.sender);

        match signal {
            SignalMessage::Description(description) => {
                self.on_remote_description(description).await
            }
            SignalMessage::Candidate(candidate) => self.on_remote_candidate(candidate).await,
        }
    }

    pub async fn handle_peer_event(&mut self, event: PeerEvent<P::Channel>) -> Result<()> {
        let result = match event {
            PeerEvent::ChannelOpen(channel) => {
                self.on_channel_open(channel);
                return Ok(());
            }
            _ if self.state.is_terminal() => return Ok(()),
            PeerEvent::NegotiationNeeded => self.on_negotiation_needed().await,
            PeerEvent::CandidateGathered(candidate) => {
                self.on_local_candidate(candidate).await;
                Ok(())
            }
            PeerEvent::ChannelAnnounced(label) => {
                debug!("Remote announced data channel '{}'", label);
                Ok(())
            }
            PeerEvent::Failed(reason) => Err(SessionError::PeerTransport(reason)),
        };

        self.settle(result)
    }

    fn settle(&mut self, result: Result<()>) -> Result<()> {
        if let Err(e) = &result {
            warn!("Negotiation failed in state {}: {}", self.state, e);
            self.state = NegotiationState::Failed;
        }
        result
    }

    async fn on_negotiation_needed(&mut self) -> Result<()> {
        if self.role != Role::Initiator || self.local_description.is_some() {
            debug!("Ignoring negotiation trigger in state {}", self.state);
            return Ok(());
        }

        let offer = self
            .peer
            .create_offer()
            .await
            .map_err(|e| SessionError::signaling("failed to create offer", e))?;
        self.commit_local(offer).await?;
        self.state = NegotiationState::AwaitingRemoteAnswer;
        Ok(())
    }

    async fn on_remote_description(&mut self, description: SessionDescription) -> Result<()> {
        if self.remote_description.is_some() {
            debug!("Ignoring duplicate remote {}", description.kind);
            return Ok(());
        }

        match (self.role, description.kind) {
            (Role::Initiator, SdpType::Answer) => {
                if self.local_description.is_none() {
                    return Err(SessionError::SignalingProtocol(
                        "answer arrived before the local offer was sent".to_owned(),
                    ));
                }
                self.commit_remote(description).await?;
                self.state = NegotiationState::Connecting;
                Ok(())
            }
            (Role::Responder, SdpType::Offer) => {
                self.commit_remote(description).await?;
                let answer = self
                    .peer
                    .create_answer()
                    .await
                    .map_err(|e| SessionError::signaling("failed to create answer", e))?;
                self.commit_local(answer).await?;
                self.state = NegotiationState::Connecting;
                Ok(())
            }
            (role, kind) => Err(SessionError::SignalingProtocol(format!(
                "{role} received an unexpected {kind}"
            ))),
        }
    }

    async fn on_remote_candidate(&mut self, candidate: IceCandidate) -> Result<()> {
        if self.remote_description.is_none() {
            debug!("Queueing remote candidate until the remote description is set");
            self.pending_remote.push(candidate);
            return Ok(());
        }

        self.peer
            .add_ice_candidate(candidate)
            .await
            .map_err(|e| SessionError::signaling("failed to add remote candidate", e))
    }

    async fn on_local_candidate(&mut self, candidate: IceCandidate) {
        if self.local_description.is_none() {
            debug!("Queueing local candidate until the local description is set");
            self.pending_local.push(candidate);
            return;
        }
        self.publish(SignalMessage::Candidate(candidate)).await;
    }

    fn on_channel_open(&mut self, channel: P::Channel) {
        if self.state == NegotiationState::Failed {
            debug!("Dropping data channel that opened after failure");
            return;
        }
        if self.channel.resolve(channel) {
            info!("Data channel open in room {}", self.room.name());
            self.state = NegotiationState::ChannelOpen;
        } else {
            debug!("Ignoring repeated channel open");
        }
    }

    /// Sets, publishes and records the local description, then releases queued candidates.
    async fn commit_local(&mut self, description: SessionDescription) -> Result<()> {
        self.peer
            .set_local_description(description.clone())
            .await
            .map_err(|e| SessionError::signaling("failed to set local description", e))?;
        self.local_description = Some(description.clone());
        self.publish(SignalMessage::Description(description)).await;

        for candidate in std::mem::take(&mut self.pending_local) {
            self.publish(SignalMessage::Candidate(candidate)).await;
        }
        Ok(())
    }

    async fn commit_remote(&mut self, description: SessionDescription) -> Result<()> {
        self.peer
            .set_remote_description(description.clone())
            .await
            .map_err(|e| SessionError::signaling("failed to set remote description", e))?;
        self.remote_description = Some(description);

        let pending = std::mem::take(&mut self.pending_remote);
        if !pending.is_empty() {
            debug!("Applying {} queued remote candidates", pending.len());
        }
        for candidate in pending {
            self.peer
                .add_ice_candidate(candidate)
                .await
                .map_err(|e| SessionError::signaling("failed to add queued remote candidate", e))?;
        }
        Ok(())
    }

    async fn publish(&self, message: SignalMessage) {
        match serde_json::to_value(&message) {
            Ok(payload) => {
                debug!("Publishing {} to {}", message.kind(), self.room.name());
                self.room.publish(payload).await;
            }
            Err(e) => warn!("Failed to encode {}: {}", message.kind(), e),
        }
    }
}
