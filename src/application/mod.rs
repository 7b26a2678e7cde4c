pub mod coordinator;
pub mod use_cases;

pub use coordinator::*;
