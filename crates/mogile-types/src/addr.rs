use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// `host:port` address of one tracker.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackerAddr {
    host: String,
    port: u16,
}

impl TrackerAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Parse a comma-separated tracker list, e.g. `"10.0.0.1:7001,10.0.0.2:7001"`.
    pub fn parse_list(list: &str) -> Result<Vec<TrackerAddr>, TypeError> {
        list.split(',').map(|entry| entry.trim().parse()).collect()
    }
}

impl FromStr for TrackerAddr {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| TypeError::InvalidTrackerAddr(s.to_string()))?;
        if host.is_empty() {
            return Err(TypeError::InvalidTrackerAddr(s.to_string()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| TypeError::InvalidTrackerAddr(s.to_string()))?;
        Ok(Self { host: host.to_string(), port })
    }
}

impl fmt::Debug for TrackerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrackerAddr({}:{})", self.host, self.port)
    }
}

impl fmt::Display for TrackerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
