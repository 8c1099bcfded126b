mod admission_guard;

pub use admission_guard::*;
