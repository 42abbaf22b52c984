mod latch;
mod negotiation_state;
mod negotiator;

pub use latch::Latch;
pub use negotiation_state::NegotiationState;
pub use negotiator::{DEFAULT_NEGOTIATION_TIMEOUT, Negotiator};

pub(crate) use negotiator::DEFAULT_CHANNEL_LABEL;
