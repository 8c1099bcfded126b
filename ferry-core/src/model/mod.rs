mod frame;
mod peer;
mod record;
mod room;
mod signaling;

pub use frame::{ControlFrame, Frame};
pub use peer::PeerId;
pub use record::{TransferDirection, TransferHistory, TransferRecord};
pub use room::RoomId;
pub use signaling::{ClientSignal, IceServerConfig, ServerSignal};
