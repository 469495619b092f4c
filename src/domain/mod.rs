pub mod error;
pub mod metadata;

pub use error::DomainError;
pub use metadata::*;
