//! Client error types.

use std::io;

use thiserror::Error;

use mogile_pool::PoolError;
use mogile_types::TypeError;

/// Errors surfaced by [`StorageClient`](crate::StorageClient) operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The client configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// A domain or key argument failed validation.
    #[error("invalid argument: {0}")]
    Invalid(#[from] TypeError),

    /// The tracker does not know the key.
    #[error("{domain}/{key} not found")]
    NotFound { domain: String, key: String },

    /// The tracker answered with an application-level error.
    #[error("tracker error {code}: {message}")]
    Tracker { code: String, message: String },

    /// No tracker could be reached, or the exchange failed in transit.
    #[error("transport error: {0}")]
    Transport(#[from] PoolError),

    /// A tracker reply was well formed but missing required content.
    #[error("unusable tracker reply: {0}")]
    BadResponse(String),

    /// A storage node rejected the transfer.
    #[error("storage node returned {status} for {url}")]
    NodeStatus { status: u16, url: String },

    /// HTTP-level failure talking to a storage node.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Local file or temp file failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
