//! Command names understood by the tracker.

/// Resolve the storage paths for a key.
pub const GET_PATHS: &str = "get_paths";
/// Reserve a fid and an upload destination.
pub const CREATE_OPEN: &str = "create_open";
/// Commit an uploaded file.
pub const CREATE_CLOSE: &str = "create_close";
/// Remove a key.
pub const DELETE: &str = "delete";
/// Rename a key within a domain.
pub const RENAME: &str = "rename";
/// Ask the tracker to pause before answering, for testing.
pub const SLEEP: &str = "sleep";

/// Raw line that switches a connection into the event stream.
///
/// Sent verbatim, outside the normal request builder.
pub const WATCH_LINE: &str = "!watch\r\n";
