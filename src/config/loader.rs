// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration loading from files.
//!
//! Handles loading configuration from JSON and YAML files in various locations.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::ServerConfig;

/// Config file names to search for (in order).
pub const CONFIG_FILES: &[&str] = &[
    ".codepilot.json",
    ".codepilot.yaml",
    ".codepilot.yml",
    ".codepilot/config.json",
];

/// Global config directory name.
pub const GLOBAL_CONFIG_DIR: &str = ".codepilot";

/// Global config file name.
pub const GLOBAL_CONFIG_FILE: &str = "config.json";

/// Get the global config directory path.
pub fn get_global_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(GLOBAL_CONFIG_DIR))
}

/// Get the global config file path.
pub fn get_global_config_path() -> Option<PathBuf> {
    get_global_config_dir().map(|dir| dir.join(GLOBAL_CONFIG_FILE))
}

/// Load global configuration from ~/.codepilot/config.json.
pub fn load_global_config() -> Result<Option<serde_json::Value>, ConfigError> {
    let path = match get_global_config_path() {
        Some(p) => p,
        None => return Ok(None),
    };

    if !path.exists() {
        return Ok(None);
    }

    load_config_value(&path).map(Some)
}

/// Load workspace configuration from the workspace root.
///
/// The first file of [`CONFIG_FILES`] that exists wins.
pub fn load_workspace_config(workspace_root: &Path) -> Result<Option<serde_json::Value>, ConfigError> {
    for filename in CONFIG_FILES {
        let path = workspace_root.join(filename);
        if path.exists() {
            return load_config_value(&path).map(Some);
        }
    }
    Ok(None)
}

/// Load a configuration file (JSON or YAML) as an untyped value.
///
/// Values are merged before being typed so a file only needs the fields it overrides.
pub fn load_config_value(path: &Path) -> Result<serde_json::Value, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(ConfigError::from),
        _ => serde_json::from_str(&content).map_err(ConfigError::from),
    }
}

/// Load a single configuration file as a typed config.
pub fn load_config_file(path: &Path) -> Result<ServerConfig, ConfigError> {
    let value = load_config_value(path)?;
    serde_json::from_value(value).map_err(ConfigError::from)
}

/// Save configuration to a file in the workspace root.
pub fn save_config(
    workspace_root: &Path,
    config: &ServerConfig,
    filename: Option<&str>,
) -> Result<PathBuf, ConfigError> {
    let filename = filename.unwrap_or(CONFIG_FILES[0]);
    let path = workspace_root.join(filename);

    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, content)?;

    Ok(path)
}

/// Write a default config file unless one already exists.
pub fn init_config(workspace_root: &Path) -> Result<PathBuf, ConfigError> {
    let path = workspace_root.join(CONFIG_FILES[0]);
    if path.exists() {
        return Err(ConfigError::InvalidValue {
            field: "path".to_string(),
            message: format!("{} already exists", path.display()),
        });
    }
    save_config(workspace_root, &ServerConfig::default(), None)
}
