mod direct_channel;
mod memory_channel;
mod rtc_channel;

pub use direct_channel::*;
pub use memory_channel::*;
pub use rtc_channel::*;
