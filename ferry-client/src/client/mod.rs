mod client;
mod client_command;
mod client_event;
mod client_handle;

pub use client::*;
pub use client_command::*;
pub use client_event::*;
pub use client_handle::*;
