//! Market data aggregate: OHLC records, validated datasets and their value objects.

pub mod entities;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use services::DataValidationService;
pub use value_objects::*;
