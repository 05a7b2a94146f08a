//! Foundation types for the mogile client.
//!
//! This crate provides the naming and addressing types shared by every other
//! mogile crate, plus the protocol default constants.
//!
//! # Key Types
//!
//! - [`Domain`] — Namespace scoping all keys on the storage backend
//! - [`Key`] — Opaque identifier for one stored object within a domain
//! - [`StorageClass`] — Replication/policy tag passed through to the tracker
//! - [`TrackerAddr`] — `host:port` address of one tracker

pub mod addr;
pub mod class;
pub mod defaults;
pub mod domain;
pub mod error;
pub mod key;

pub use addr::TrackerAddr;
pub use class::StorageClass;
pub use domain::Domain;
pub use error::TypeError;
pub use key::Key;
