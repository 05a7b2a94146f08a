//! Tracker line protocol for the mogile client.
//!
//! Everything here is pure: building request lines, form-encoding
//! parameters, and parsing the `OK` / `ERR` replies a tracker sends
//! back. No sockets; transport lives in `mogile-pool`.
//!
//! # Key Types
//!
//! - [`Params`] — Ordered request parameters with metadata slots
//! - [`Response`] — A parsed `OK` or `ERR` reply
//! - [`ProtoError`] — Wire format violations

pub mod command;
pub mod error;
pub mod params;
pub mod request;
pub mod response;
pub mod urlenc;

pub use error::{ProtoError, ProtoResult};
pub use params::Params;
pub use request::build_request;
pub use response::{parse_response, parse_terminated, Response};
