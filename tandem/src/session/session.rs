use tandem_core::Role;

/// Result of a completed negotiation: the role this process played and the open channel.
///
/// No signaling happens after a session exists; dropping it drops the channel.
#[derive(Debug)]
pub struct Session<C> {
    role: Role,
    channel: C,
}

impl<C> Session<C> {
    pub(crate) fn new(role: Role, channel: C) -> Self {
        Self { role, channel }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_initiator(&self) -> bool {
        self.role == Role::Initiator
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn into_channel(self) -> C {
        self.channel
    }

    pub fn into_parts(self) -> (Role, C) {
        (self.role, self.channel)
    }
}
