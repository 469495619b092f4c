use thiserror::Error;

/// Errors raised by the wire codec and the metadata log parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("insufficient data: need {needed} bytes but {remaining} remain")]
    InsufficientData { needed: usize, remaining: usize },

    #[error("truncated varint")]
    TruncatedVarint,

    /// Recoverable: the parser realigns the cursor and keeps going.
    #[error(
        "record boundary mismatch in batch {batch}, record {record}: expected offset {expected}, got {actual}"
    )]
    RecordBoundaryMismatch {
        batch: usize,
        record: usize,
        expected: usize,
        actual: usize,
    },

    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("unsupported api key: {0}")]
    UnsupportedApiKey(i16),

    #[error("request too short: need {needed} bytes but got {actual}")]
    TooShort { needed: usize, actual: usize },

    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),
}

impl DomainError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DomainError::RecordBoundaryMismatch { .. })
    }
}
