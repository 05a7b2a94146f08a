//! On-disk CLI configuration.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// Defaults read from a TOML file and merged under the command-line
/// flags (a flag always wins).
///
/// ```toml
/// trackers = "10.0.0.1:7001,10.0.0.2:7001"
/// domain = "media"
/// class = "hotcopies"
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub trackers: Option<String>,
    pub domain: Option<String>,
    pub class: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))
    }
}
