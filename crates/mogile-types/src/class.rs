use std::fmt;

use serde::{Deserialize, Serialize};

/// Replication/policy tag attached to stored content.
///
/// Opaque to the client and passed through to the tracker unmodified. The
/// empty class is valid and selects the server-side default policy.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageClass(String);

impl StorageClass {
    pub fn new(class: impl Into<String>) -> Self {
        Self(class.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the empty class (server default policy).
    pub fn is_default(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageClass({})", self.0)
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StorageClass {
    fn from(class: &str) -> Self {
        Self(class.to_string())
    }
}

impl From<String> for StorageClass {
    fn from(class: String) -> Self {
        Self(class)
    }
}

impl AsRef<str> for StorageClass {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
