// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Turn policy inputs and outputs.

use crate::agents::Agent;
use crate::config::RunnerConfig;

/// Switches that shape turn selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyConfig {
    /// Length of the trailing run of answering turns that triggers moderation.
    pub moderator_threshold: usize,
    /// Whether the moderator may be selected by the threshold rule.
    pub moderator_enabled: bool,
    /// Whether peer experts take turns.
    pub multi_experts_enabled: bool,
    /// Always answer with the retrieval-only agent.
    pub baseline_only: bool,
    /// Upper bound on the roster size.
    pub max_experts: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::from(&RunnerConfig::default())
    }
}

impl From<&RunnerConfig> for PolicyConfig {
    fn from(config: &RunnerConfig) -> Self {
        Self {
            moderator_threshold: config.moderator_override_n_consecutive_answering_turn,
            moderator_enabled: !config.disable_moderator,
            multi_experts_enabled: !config.disable_multi_experts,
            baseline_only: config.rag_only_baseline_mode,
            max_experts: config.max_num_round_table_experts,
        }
    }
}

/// One-shot request to hand the next turn to the moderator.
///
/// Owned by the caller and passed into each selection; a non-dry-run
/// selection that honours it clears it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeratorOverride {
    pending: bool,
}

impl ModeratorOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self) {
        self.pending = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Clear the request, returning whether it was set.
    pub fn consume(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}

/// Per-call options for [`TurnPolicyEngine::select`](super::TurnPolicyEngine::select).
#[derive(Debug, Default)]
pub struct SelectRequest<'a> {
    /// Compute the decision without rotating the roster or consuming the override.
    pub dry_run: bool,
    /// Hand the turn to the simulated user.
    pub simulate_user: bool,
    /// Intent given to the simulated user.
    pub intent: Option<String>,
    /// Pending moderator override, if the caller keeps one.
    pub moderator_override: Option<&'a mut ModeratorOverride>,
}

impl<'a> SelectRequest<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn simulate_user(mut self, intent: Option<String>) -> Self {
        self.simulate_user = true;
        self.intent = intent;
        self
    }

    pub fn with_override(mut self, moderator_override: &'a mut ModeratorOverride) -> Self {
        self.moderator_override = Some(moderator_override);
        self
    }
}

/// Who acts next and which side effects apply to the turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnDecision {
    pub agent: Agent,
    pub reorganize_knowledge_base: bool,
    pub update_expert_list: bool,
    pub polish_utterance: bool,
}

impl TurnDecision {
    pub fn new(agent: Agent) -> Self {
        Self {
            agent,
            reorganize_knowledge_base: false,
            update_expert_list: false,
            polish_utterance: false,
        }
    }
}
