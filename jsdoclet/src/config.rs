//! `jsdoclet.json` configuration.

use anyhow::{Context, Result};
use jsdoclet_core::ParserOptions;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Config file looked up in the working directory when `-c` is not given.
pub const DEFAULT_CONFIG: &str = "jsdoclet.json";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub plugins: Vec<String>,
    pub tags: ParserOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Files, directories or glob patterns to document.
    pub include: Vec<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))
    }

    /// Load the config named on the command line, which must exist, or the
    /// default one when present.
    pub fn resolve(explicit: Option<&Path>) -> Result<Config> {
        match explicit {
            Some(path) => Config::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG);
                if fallback.is_file() {
                    Config::load(fallback)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }
}
