//! Protocol defaults shared by the pool and client crates.

use std::time::Duration;

/// Store attempts per operation before giving up.
pub const MAX_RETRIES: u32 = 2;

/// Pause between store attempts.
pub const RETRY_WAIT: Duration = Duration::from_secs(1);

/// Per-operation timeout for tracker exchanges (connect, send, receive).
pub const TRACKER_TIMEOUT: Duration = Duration::from_secs(2);

/// Connect timeout for storage-node HTTP transfers.
pub const NODE_TIMEOUT: Duration = Duration::from_secs(2);

/// Fetches above this size spill to a temporary file instead of memory.
pub const MAX_BUFFER_SIZE: usize = 100 * 1024;

/// Idle tracker connections older than this are closed by maintenance.
pub const CONNECTION_EXPIRE: Duration = Duration::from_secs(60);

/// Interval between pool maintenance passes.
pub const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(2);

/// Upper bound on the path count a get_paths reply may claim.
pub const MAX_PATHS: usize = 100;

/// Pause before redialing a broken watch connection.
pub const WATCH_RETRY_WAIT: Duration = Duration::from_secs(1);
