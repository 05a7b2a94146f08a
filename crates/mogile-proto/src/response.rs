//! Tracker response parsing.
//!
//! A tracker answers every request with a single line, either
//! `OK [fid] key=value&...` or `ERR code description`. An `ERR` line
//! is still a well-formed exchange; only lines outside both shapes
//! are protocol errors.

use crate::error::{ProtoError, ProtoResult};
use crate::params::Params;
use crate::urlenc;

/// A parsed tracker reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// `OK` with decoded parameters.
    Ok(Params),
    /// `ERR` with a machine code and a human description.
    Error { code: String, message: String },
}

impl Response {
    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok(_))
    }
}

/// Parse a full response line including the `\r\n` terminator.
pub fn parse_terminated(line: &str) -> ProtoResult<Response> {
    let body = line
        .strip_suffix("\r\n")
        .ok_or_else(|| ProtoError::Format("response line not CRLF terminated".into()))?;
    parse_response(body)
}

/// Parse a response line with the terminator already stripped.
pub fn parse_response(line: &str) -> ProtoResult<Response> {
    if let Some(rest) = line.strip_prefix("OK ") {
        parse_ok(rest)
    } else if let Some(rest) = line.strip_prefix("ERR ") {
        parse_err(rest)
    } else {
        Err(ProtoError::Format(format!(
            "response is neither OK nor ERR: {line:?}"
        )))
    }
}

fn parse_ok(rest: &str) -> ProtoResult<Response> {
    // An OK line may carry a numeric id before the parameter list. A
    // bare acknowledgement with no parameters at all is valid; commit
    // and delete replies look like that.
    let start = rest
        .find(|c: char| c != ' ' && !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let mut params = Params::new();
    for pair in rest[start..].split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| ProtoError::Format(format!("parameter without '=': {pair:?}")))?;
        params.add(key, urlenc::decode(value));
    }
    Ok(Response::Ok(params))
}

fn parse_err(rest: &str) -> ProtoResult<Response> {
    let rest = rest.trim_start_matches(' ');
    let (code, desc) = rest
        .split_once(' ')
        .ok_or_else(|| ProtoError::Format("ERR response missing description".into()))?;
    let desc = desc.trim_start_matches(' ');
    if desc.is_empty() {
        return Err(ProtoError::Format("ERR response missing description".into()));
    }
    Ok(Response::Error {
        code: urlenc::decode(code),
        message: urlenc::decode(desc),
    })
}
