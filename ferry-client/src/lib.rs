pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod signaling;
pub mod transfer;

pub use channel::{DirectChannel, MemoryChannel, MemoryReceiver, RtcChannel};
pub use client::{Client, ClientCommand, ClientEvent, ClientHandle};
pub use config::ClientConfig;
pub use error::{ChannelError, ConfigError, SessionError, TransferError};
pub use transfer::FileData;
