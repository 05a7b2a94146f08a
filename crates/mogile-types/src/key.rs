use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Opaque identifier for one stored object within a domain.
///
/// Keys are arbitrary non-empty strings; path-like keys such as
/// `/photos/2024/cat.jpg` are common but carry no structure the client
/// interprets. Unique per domain.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key(String);

impl Key {
    /// Create a key, rejecting the empty string.
    pub fn new(key: impl Into<String>) -> Result<Self, TypeError> {
        let key = key.into();
        if key.is_empty() {
            return Err(TypeError::EmptyKey);
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.0)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_path_like_keys() {
        let k = Key::new("/some_path2/some_file").unwrap();
        assert_eq!(k.as_str(), "/some_path2/some_file");
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(Key::new("").unwrap_err(), TypeError::EmptyKey);
    }

    #[test]
    fn accepts_awkward_bytes() {
        // keys are opaque; the wire layer escapes them
        let k = Key::new("a key&with=reserved chars").unwrap();
        assert_eq!(k.as_str(), "a key&with=reserved chars");
    }
}
