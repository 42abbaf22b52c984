use tandem_core::IceCandidate;

/// Events a peer transport surfaces to the negotiator driving it.
#[derive(Debug)]
pub enum PeerEvent<C> {
    /// The engine needs a local offer. Fired once the data channel has been requested.
    NegotiationNeeded,

    /// A local candidate was gathered and has to reach the remote side.
    CandidateGathered(IceCandidate),

    /// The remote side announced a data channel with this label.
    ChannelAnnounced(String),

    /// A data channel is open and ready to carry messages.
    ChannelOpen(C),

    /// The underlying connection failed and cannot recover.
    Failed(String),
}
