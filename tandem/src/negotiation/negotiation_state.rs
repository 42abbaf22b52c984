use std::fmt;

/// Where a [`Negotiator`](crate::Negotiator) is in the offer/answer exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NegotiationState {
    Idle,
    /// Initiator: data channel requested, offer not committed yet.
    AwaitingLocalDescription,
    /// Responder: waiting for the offer.
    AwaitingRemoteDescription,
    /// Initiator: offer published, waiting for the answer.
    AwaitingRemoteAnswer,
    /// Both descriptions committed, waiting for the channel to open.
    Connecting,
    ChannelOpen,
    Failed,
}

impl NegotiationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::ChannelOpen | Self::Failed)
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::AwaitingLocalDescription => "awaiting-local-description",
            Self::AwaitingRemoteDescription => "awaiting-remote-description",
            Self::AwaitingRemoteAnswer => "awaiting-remote-answer",
            Self::Connecting => "connecting",
            Self::ChannelOpen => "channel-open",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
