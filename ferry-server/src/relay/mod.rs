mod participant;
mod relay;
mod relay_command;

pub use participant::*;
pub use relay::*;
pub use relay_command::*;
