use thiserror::Error;

/// Errors produced by type construction and parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("domain cannot be empty")]
    EmptyDomain,

    #[error("key cannot be empty")]
    EmptyKey,

    #[error("invalid tracker address {0:?}: expected host:port")]
    InvalidTrackerAddr(String),
}
