use thiserror::Error;

use crate::edge::{Edge, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("window range must be positive, got {0}")]
    InvalidRange(Timestamp),
    #[error("window slide must be positive, got {0}")]
    InvalidSlide(Timestamp),
    #[error("unknown engine {0:?}, expected one of: {1}")]
    UnknownEngine(String, String),
}

/// Precondition violations, only reported when the window is configured as strict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("edge {next} arrived after timestamp {previous}")]
    OutOfOrder { previous: Timestamp, next: Edge },
    #[error("edge {next} arrived {gap} after timestamp {previous}, slide is {slide}")]
    GapTooLarge {
        previous: Timestamp,
        next: Edge,
        gap: Timestamp,
        slide: Timestamp,
    },
}
