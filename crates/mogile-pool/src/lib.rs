//! Tracker connection pooling for the mogile client.
//!
//! This crate owns the TCP side of talking to trackers: dialing,
//! pooling idle connections per tracker, walking the active set with
//! failover, and the background maintenance task that probes downed
//! trackers back to life.
//!
//! # Key Types
//!
//! - [`TrackerPool`] — Active/inactive membership with failover dispatch
//! - [`TrackerConn`] — One buffered connection to one tracker
//! - [`PoolConfig`] — Timeouts and maintenance tunables
//! - [`PoolError`] — Transport failures

pub mod conn;
pub mod error;
pub mod pool;

pub use conn::TrackerConn;
pub use error::{PoolError, PoolResult};
pub use pool::{PoolConfig, TrackerPool};
