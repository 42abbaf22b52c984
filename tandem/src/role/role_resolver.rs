use crate::error::{Result, SessionError};
use tandem_core::{MemberId, Role};

/// Decides this process's role from the membership snapshot seen right after joining.
///
/// The first joiner cannot know whether a peer will ever show up, so it waits
/// for an offer. The second joiner already sees both members and offers.
pub fn resolve_role(members: &[MemberId]) -> Result<Role> {
    match members.len() {
        1 => Ok(Role::Responder),
        2 => Ok(Role::Initiator),
        size => Err(SessionError::UnexpectedRoomSize { size }),
    }
}
