// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration type definitions.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default wait for a human reply (30 minutes).
pub const DEFAULT_REPLY_TIMEOUT_SECS: u64 = 30 * 60;

/// Knobs of the multi-agent discourse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Topic of the discourse; the session fills it from the user request when empty.
    pub topic: String,
    /// Passages retrieved per query.
    pub retrieve_top_k: usize,
    /// Search queries issued per turn.
    pub max_search_queries: usize,
    /// Upper bound on discourse turns.
    pub total_conv_turn: usize,
    /// Upper bound on the peer-expert roster.
    pub max_num_round_table_experts: usize,
    /// Consecutive answering turns that make the moderator step in.
    #[serde(rename = "moderator_override_N_consecutive_answering_turn")]
    pub moderator_override_n_consecutive_answering_turn: usize,
    pub disable_moderator: bool,
    pub disable_multi_experts: bool,
    pub rag_only_baseline_mode: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            topic: String::new(),
            retrieve_top_k: 10,
            max_search_queries: 2,
            total_conv_turn: 20,
            max_num_round_table_experts: 2,
            moderator_override_n_consecutive_answering_turn: 3,
            disable_moderator: false,
            disable_multi_experts: false,
            rag_only_baseline_mode: false,
        }
    }
}

/// Per-session options carried by the `default` start message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Ask the edit generator to review its own output.
    pub review: bool,
    /// Review iterations allowed to the edit generator.
    pub max_iterations: u32,
    /// Directory edits are resolved against.
    pub root_directory: PathBuf,
    /// Run the multi-agent discourse before generating edits.
    pub use_storm: bool,
    /// Include cross-file relationships in the repository summary.
    pub include_semantic_relationships: bool,
    /// Accepted for client compatibility; no tool servers are attached.
    pub use_mcp: bool,
    /// Accepted for client compatibility; generation backends are injected.
    pub use_ollama: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            review: true,
            max_iterations: 1,
            root_directory: PathBuf::from("."),
            use_storm: true,
            include_semantic_relationships: false,
            use_mcp: false,
            use_ollama: false,
        }
    }
}

/// Settings loaded from config files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Seconds to wait for a human reply; `null` waits forever.
    pub reply_timeout_secs: Option<u64>,
    /// Discourse knobs.
    pub runner: RunnerConfig,
    /// Session defaults, overridden field by field by the start message.
    pub session: SessionConfig,
    /// Default socket path for `serve`.
    pub socket_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            reply_timeout_secs: Some(DEFAULT_REPLY_TIMEOUT_SECS),
            runner: RunnerConfig::default(),
            session: SessionConfig::default(),
            socket_path: None,
        }
    }
}

impl ServerConfig {
    pub fn reply_timeout(&self) -> Option<Duration> {
        self.reply_timeout_secs.map(Duration::from_secs)
    }
}

/// Command-line overrides, applied last.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub reply_timeout_secs: Option<u64>,
    pub max_turns: Option<usize>,
    pub socket_path: Option<PathBuf>,
}
