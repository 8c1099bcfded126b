pub mod backpressure;
mod file;
mod inbound;
mod outbound;
pub mod stats;

pub use backpressure::Backpressure;
pub use file::*;
pub use inbound::*;
pub use outbound::*;
pub use stats::{Progress, StatsSampler};
