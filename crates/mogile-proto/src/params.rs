//! Ordered request and response parameters.

/// An ordered list of `key=value` parameters.
///
/// Order is preserved because the tracker cares about it for metadata:
/// each [`add_meta`](Params::add_meta) call appends a numbered
/// `plugin.meta.keyN` / `plugin.meta.valueN` pair, and the request
/// builder announces the count up front.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
    meta_count: usize,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plain parameter.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    /// Append a metadata pair as the next numbered slot.
    pub fn add_meta(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let slot = self.meta_count;
        self.pairs.push((format!("plugin.meta.key{slot}"), key.into()));
        self.pairs.push((format!("plugin.meta.value{slot}"), value.into()));
        self.meta_count += 1;
        self
    }

    /// Look up a parameter by key. Later additions shadow earlier ones.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Number of metadata pairs added through [`add_meta`](Params::add_meta).
    pub fn meta_count(&self) -> usize {
        self.meta_count
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
