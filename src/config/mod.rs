// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration module for codepilot.
//!
//! Handles loading and merging of configuration from multiple sources:
//! - Global config: ~/.codepilot/config.json
//! - Workspace config: .codepilot.json, .codepilot.yaml or .codepilot/config.json
//! - Explicit `--config` file
//! - CLI options: command-line arguments
//!
//! Configuration is merged with precedence (CLI > explicit > workspace > global > defaults).
//! Per-session options arrive with the `default` start message and override
//! the `session` section field by field.

mod loader;
mod types;

pub use loader::{
    get_global_config_dir, get_global_config_path, init_config, load_config_file,
    load_config_value, load_global_config, load_workspace_config, save_config, CONFIG_FILES,
    GLOBAL_CONFIG_DIR, GLOBAL_CONFIG_FILE,
};
pub use types::{
    CliOptions, RunnerConfig, ServerConfig, SessionConfig, DEFAULT_REPLY_TIMEOUT_SECS,
};

use std::path::Path;

use serde_json::Value;

use crate::error::ConfigError;

/// Load and merge all configuration sources for a workspace.
pub fn load_config(
    workspace_root: &Path,
    explicit: Option<&Path>,
    cli: &CliOptions,
) -> Result<ServerConfig, ConfigError> {
    let mut merged = serde_json::to_value(ServerConfig::default())?;

    if let Some(global) = load_global_config()? {
        merge_values(&mut merged, global);
    }
    if let Some(workspace) = load_workspace_config(workspace_root)? {
        merge_values(&mut merged, workspace);
    }
    if let Some(path) = explicit {
        merge_values(&mut merged, load_config_value(path)?);
    }

    let mut config: ServerConfig = serde_json::from_value(merged)?;
    apply_cli(&mut config, cli);
    Ok(config)
}

/// Overlay the `config` object of a start message onto session defaults.
pub fn session_from_overrides(
    defaults: &SessionConfig,
    overrides: Option<&Value>,
) -> Result<SessionConfig, ConfigError> {
    let mut merged = serde_json::to_value(defaults)?;
    if let Some(overrides) = overrides {
        if !overrides.is_null() {
            merge_values(&mut merged, overrides.clone());
        }
    }
    serde_json::from_value(merged).map_err(ConfigError::from)
}

fn apply_cli(config: &mut ServerConfig, cli: &CliOptions) {
    if let Some(secs) = cli.reply_timeout_secs {
        // Zero disables the bound
        config.reply_timeout_secs = (secs > 0).then_some(secs);
    }
    if let Some(turns) = cli.max_turns {
        config.runner.total_conv_turn = turns;
    }
    if let Some(path) = &cli.socket_path {
        config.socket_path = Some(path.clone());
    }
}

/// Recursively merge `overlay` into `base`; objects merge, everything else replaces.
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
