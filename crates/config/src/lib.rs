//! Configuration file helpers for pstbridge
//!
//! Loads and saves JSON files in the per-user config directory
//! (~/.config/pstbridge/ on Linux) or at explicit paths. Export
//! configurations are stored here by the `pst` crate. A missing file loads as
//! the type's defaults; saving creates the directory on first use.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Directory name under the platform config directory
const APP_DIR: &str = "pstbridge";

/// Per-user config directory (~/.config/pstbridge/)
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_DIR))
}

/// Path of `filename` inside the config directory
pub fn config_path(filename: &str) -> Option<PathBuf> {
    config_dir().map(|p| p.join(filename))
}

/// Read and deserialize a JSON file at any path
pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Like [`load_json_file`], but a missing file yields `T::default()`
pub fn load_json_file_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    load_json_file(path)
}

/// Read `filename` from the config directory; defaults when it is absent
pub fn load_json_or_default<T: DeserializeOwned + Default>(filename: &str) -> Result<T> {
    match config_path(filename) {
        Some(path) => load_json_file_or_default(&path),
        None => Ok(T::default()),
    }
}

/// Serialize `value` as pretty JSON to `path`, creating missing parents
pub fn save_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
    }
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))
}

/// Save `value` as `filename` in the config directory
pub fn save_json<T: Serialize>(filename: &str, value: &T) -> Result<()> {
    let path = config_path(filename).context("Could not determine config directory")?;
    save_json_file(&path, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        limit: u32,
    }

    #[test]
    fn test_config_dir() {
        let dir = config_dir();
        assert!(dir.is_some());
        assert!(dir.unwrap().ends_with("pstbridge"));
    }

    #[test]
    fn test_config_path() {
        let path = config_path("export.json").unwrap();
        assert!(path.ends_with("pstbridge/export.json"));
    }

    #[test]
    fn test_load_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        std::fs::write(&path, r#"{ "name": "backup", "limit": 10 }"#).unwrap();

        let sample: Sample = load_json_file(&path).unwrap();
        assert_eq!(
            sample,
            Sample {
                name: "backup".to_string(),
                limit: 10
            }
        );
    }

    #[test]
    fn test_load_json_file_errors_name_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_json_file::<Sample>(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
        assert!(load_json_file::<Sample>(&dir.path().join("absent.json")).is_err());
    }

    #[test]
    fn test_missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let sample: Sample = load_json_file_or_default(&dir.path().join("absent.json")).unwrap();
        assert_eq!(sample, Sample::default());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sample.json");
        let sample = Sample {
            name: "archive".to_string(),
            limit: 3,
        };

        save_json_file(&path, &sample).unwrap();
        let loaded: Sample = load_json_file_or_default(&path).unwrap();
        assert_eq!(loaded, sample);
    }
}
