//! Metrics aggregate: range tokens, samples, series and their synthesis.

pub mod entities;
pub mod range;
pub mod repositories;
pub mod synthesizer;
pub mod value_objects;

pub use entities::*;
pub use range::resolve;
pub use repositories::MetricsSource;
pub use value_objects::*;
