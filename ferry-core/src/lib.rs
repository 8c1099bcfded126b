pub mod error;
pub mod model;
pub mod utils;

pub use error::{AdmissionError, ValidationError};
pub use model::*;
