mod establish;
mod session;
mod session_config;

pub use establish::{connect_to_room, establish_session};
pub use session::Session;
pub use session_config::SessionConfig;
