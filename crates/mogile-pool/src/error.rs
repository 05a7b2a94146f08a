//! Transport and pool error types.

use std::io;
use std::time::Duration;

use thiserror::Error;

use mogile_types::TrackerAddr;

/// Errors produced by the tracker pool and its connections.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Every configured tracker is deactivated, or none were configured.
    #[error("no active trackers")]
    NoTrackers,

    /// TCP connect to a tracker failed.
    #[error("connect to tracker {addr} failed: {source}")]
    Connect {
        addr: TrackerAddr,
        #[source]
        source: io::Error,
    },

    /// An exchange did not finish within its deadline.
    #[error("tracker operation timed out after {0:?}")]
    Timeout(Duration),

    /// The tracker closed the connection mid-exchange.
    #[error("tracker closed the connection")]
    Closed,

    /// The reply did not follow the wire format.
    #[error("protocol error: {0}")]
    Proto(#[from] mogile_proto::ProtoError),

    /// Socket-level read or write failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
