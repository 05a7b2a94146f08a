//! Protocol error types.

use thiserror::Error;

/// Errors raised while encoding requests or decoding tracker responses.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtoError {
    /// The tracker sent a line that does not follow the wire format.
    #[error("malformed tracker response: {0}")]
    Format(String),
}

/// Result alias for protocol operations.
pub type ProtoResult<T> = Result<T, ProtoError>;
