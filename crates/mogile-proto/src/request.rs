//! Request line construction.

use std::fmt::Write;

use crate::params::Params;
use crate::urlenc;

/// Build a complete request line: `{cmd} {params}\r\n`.
///
/// Keys and values are form-encoded individually. When metadata pairs
/// are present the parameter list is prefixed with
/// `plugin.meta.keys={count}&` so the tracker knows how many numbered
/// slots to expect.
pub fn build_request(cmd: &str, params: &Params) -> String {
    let mut line = String::with_capacity(cmd.len() + 32);
    line.push_str(cmd);
    line.push(' ');
    if params.meta_count() > 0 {
        // write! to a String cannot fail
        let _ = write!(line, "plugin.meta.keys={}&", params.meta_count());
    }
    let mut first = true;
    for (key, value) in params.iter() {
        if !first {
            line.push('&');
        }
        first = false;
        line.push_str(&urlenc::encode(key));
        line.push('=');
        line.push_str(&urlenc::encode(value));
    }
    line.push_str("\r\n");
    line
}
