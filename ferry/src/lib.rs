pub use ferry_core::{PeerId, RoomId};

pub mod model {
    pub use ferry_core::model::*;
}

pub mod utils {
    pub use ferry_core::utils::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use ferry_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use ferry_client::*;
}
