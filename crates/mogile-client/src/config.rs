//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use mogile_types::defaults;

use crate::error::{ClientError, ClientResult};

/// Configuration for a [`StorageClient`](crate::StorageClient).
///
/// Durations serialize as whole seconds.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Namespace every key of this client lives in.
    pub domain: String,
    /// Tracker addresses as `host:port`.
    pub hosts: Vec<String>,
    /// Identifier stamped into tracker events so this client can skip
    /// its own echoes on the watch stream.
    pub client_id: Option<String>,
    /// Store attempts before giving up.
    pub max_retries: u32,
    /// Pause between store attempts.
    #[serde(with = "duration_secs")]
    pub retry_wait: Duration,
    /// Dial and per-exchange tracker deadline.
    #[serde(with = "duration_secs")]
    pub tracker_timeout: Duration,
    /// Storage node connect deadline.
    #[serde(with = "duration_secs")]
    pub node_timeout: Duration,
    /// Fetches above this many bytes spill to a temporary file.
    pub max_buffer_size: usize,
    /// Background tracker probing and idle connection expiry.
    pub maintenance: bool,
}

impl ClientConfig {
    /// Config for `domain` over `hosts`, everything else defaulted.
    pub fn new(domain: impl Into<String>, hosts: Vec<String>) -> Self {
        Self {
            domain: domain.into(),
            hosts,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.domain.is_empty() {
            return Err(ClientError::Config("domain must not be empty".into()));
        }
        if self.hosts.is_empty() {
            return Err(ClientError::Config(
                "at least one tracker host is required".into(),
            ));
        }
        if self.max_retries == 0 {
            return Err(ClientError::Config("max_retries must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            hosts: Vec::new(),
            client_id: None,
            max_retries: defaults::MAX_RETRIES,
            retry_wait: defaults::RETRY_WAIT,
            tracker_timeout: defaults::TRACKER_TIMEOUT,
            node_timeout: defaults::NODE_TIMEOUT,
            max_buffer_size: defaults::MAX_BUFFER_SIZE,
            maintenance: true,
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(de)?))
    }
}
