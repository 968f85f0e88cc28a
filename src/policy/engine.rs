// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Turn selection.
//!
//! Rules are evaluated in strict priority order and the first match wins:
//!
//! 1. simulated user, when the caller asks for it
//! 2. retrieval-only baseline agent, in baseline mode
//! 3. moderator, when an override is pending
//! 4. moderator, when the trailing run of answers reaches the threshold
//! 5. the next peer expert after an answer, otherwise the general
//!    knowledge provider

use thiserror::Error;
use tracing::{debug, trace};

use super::types::{PolicyConfig, SelectRequest, TurnDecision};
use crate::agents::{Agent, AgentProfile, PeerRoster, SIMULATED_USER_ROLE};
use crate::conversation::ConversationLog;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Baseline mode requires the previous turn to come from {expected}, found {found}")]
    BaselinePrecondition { expected: String, found: String },
}

/// Decides which agent takes the next turn.
#[derive(Debug, Clone)]
pub struct TurnPolicyEngine {
    config: PolicyConfig,
    roster: PeerRoster,
}

impl TurnPolicyEngine {
    pub fn new(config: PolicyConfig) -> Self {
        Self {
            config,
            roster: PeerRoster::new(),
        }
    }

    pub fn with_roster(mut self, roster: PeerRoster) -> Self {
        self.roster = roster;
        self
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn roster(&self) -> &PeerRoster {
        &self.roster
    }

    /// Snapshot of the current experts in selection order.
    pub fn experts(&self) -> Vec<AgentProfile> {
        self.roster.profiles()
    }

    /// Replace the roster from `"Name: description"` strings.
    ///
    /// Returns the number of experts kept after truncation to the configured maximum.
    pub fn update_roster<S: AsRef<str>>(&mut self, descriptions: &[S]) -> usize {
        let profiles = PeerRoster::parse_descriptions(descriptions, self.config.max_experts);
        debug!(
            experts = ?profiles.iter().map(|p| p.role_name.as_str()).collect::<Vec<_>>(),
            "Roster replaced"
        );
        self.roster.replace(profiles);
        self.roster.len()
    }

    /// Select the agent for the next turn.
    pub fn select(
        &mut self,
        log: &ConversationLog,
        request: SelectRequest<'_>,
    ) -> Result<TurnDecision, PolicyError> {
        let SelectRequest {
            dry_run,
            simulate_user,
            intent,
            moderator_override,
        } = request;

        if simulate_user {
            trace!("Simulated user requested");
            return Ok(TurnDecision::new(Agent::simulated_user(intent)));
        }

        if self.config.baseline_only {
            return match log.last() {
                Some(turn) if turn.role == SIMULATED_USER_ROLE => {
                    Ok(TurnDecision::new(Agent::pure_rag()))
                }
                last => Err(PolicyError::BaselinePrecondition {
                    expected: SIMULATED_USER_ROLE.to_string(),
                    found: last
                        .map(|turn| turn.role.clone())
                        .unwrap_or_else(|| "an empty conversation".to_string()),
                }),
            };
        }

        if let Some(ov) = moderator_override {
            if ov.is_pending() {
                if !dry_run {
                    ov.consume();
                }
                trace!(dry_run, "Moderator override applied");
                return Ok(TurnDecision::new(Agent::moderator()));
            }
        }

        if self.config.moderator_enabled
            && log.trailing_answer_run() >= self.config.moderator_threshold
        {
            trace!(run = log.trailing_answer_run(), "Moderator threshold reached");
            let mut decision = TurnDecision::new(Agent::moderator());
            decision.reorganize_knowledge_base = true;
            return Ok(decision);
        }

        let last_questioning = log.last_is_questioning();
        let multi = self.config.multi_experts_enabled;

        let mut agent = Agent::general_knowledge_provider();
        if !last_questioning && multi {
            let next = if dry_run {
                self.roster.head().cloned()
            } else {
                self.roster.rotate()
            };
            match next {
                Some(profile) => agent = Agent::peer_expert(profile),
                None => debug!("Roster empty, falling back to general knowledge provider"),
            }
        }

        Ok(TurnDecision {
            agent,
            reorganize_knowledge_base: false,
            update_expert_list: last_questioning && multi,
            polish_utterance: true,
        })
    }
}
