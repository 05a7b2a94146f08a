//! High-level client for a MogileFS-style distributed file store.
//!
//! The entry point is [`StorageClient`]: configure a domain and a set
//! of tracker hosts, then store, fetch, delete, and rename keyed
//! content. Stores upload to HTTP storage nodes the trackers hand out;
//! fetches fall back across replicas. [`Watch`] follows the tracker
//! event stream.
//!
//! # Key Types
//!
//! - [`StorageClient`] — store/fetch/delete/rename over trackers and nodes
//! - [`ClientConfig`] — domain, hosts, and tunables (serde-ready)
//! - [`Download`] — fetched content, in memory or spilled to a temp file
//! - [`Watch`] — reconnecting tracker event stream
//! - [`ClientError`] — everything an operation can fail with

pub mod client;
pub mod config;
pub mod error;
mod node;
pub mod watch;

pub use client::StorageClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use node::Download;
pub use watch::Watch;
