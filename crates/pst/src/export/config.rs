//! Loading export configurations from disk
//!
//! Looks for `export.json` in the shared config directory
//! (~/.config/pstbridge/). A missing file means the engine defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::ExportConfig;

/// Export configuration filename in the config directory
const EXPORT_CONFIG_FILE: &str = "export.json";

impl ExportConfig {
    /// Load the user's export configuration, or the defaults if none exists
    pub fn load() -> Result<Self> {
        config::load_json_or_default(EXPORT_CONFIG_FILE)
    }

    /// Load a configuration from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        config::load_json_file(path)
    }

    /// Parse a configuration from a JSON string
    ///
    /// Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse export configuration JSON")
    }

    /// Save this configuration as the user's export configuration
    pub fn save(&self) -> Result<()> {
        config::save_json(EXPORT_CONFIG_FILE, self)
    }

    /// Save this configuration to a specific JSON file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        config::save_json_file(path, self)
    }

    /// Get the default configuration file path (~/.config/pstbridge/export.json)
    pub fn default_path() -> Option<PathBuf> {
        config::config_path(EXPORT_CONFIG_FILE)
    }
}
