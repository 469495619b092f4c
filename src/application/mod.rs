pub mod broker;
pub mod error;

pub use broker::{KafkaBroker, TopicLookup};
pub use error::{ApplicationError, Result};
