mod peer_event;
mod peer_session;
mod rtc_peer;
mod session_state;
mod session_table;

pub use peer_event::*;
pub use peer_session::*;
pub use rtc_peer::*;
pub use session_state::*;
pub use session_table::*;
