// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Multi-agent discourse over a shared conversation log.
//!
//! A [`Discourse`] owns the log, the turn policy and the pending moderator
//! override. It is driven one turn at a time by a single task, so none of
//! its state is locked.

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};

use crate::agents::{Agent, SIMULATED_USER_ROLE};
use crate::collaborators::{Collaborators, Generated};
use crate::config::RunnerConfig;
use crate::conversation::{ConversationLog, Turn, UtteranceType};
use crate::error::{CollaboratorError, SessionError};
use crate::policy::{ModeratorOverride, PolicyConfig, SelectRequest, TurnDecision, TurnPolicyEngine};
use crate::types::{TokenUsage, TokenUsageReport};

/// Role recorded on background knowledge.
pub const SYSTEM_ROLE: &str = "System";

/// Marker an agent uses to end the discourse early.
pub const FINAL_ANSWER_MARKER: &str = "FINAL ANSWER";

/// One completed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnRecord {
    /// Position of the turn in the conversation log.
    pub index: usize,
    pub agent: Agent,
    pub turn: Turn,
    /// Usage reported by the generator for this turn, if any.
    pub usage: Option<TokenUsageReport>,
}

impl TurnRecord {
    /// Whether the agent declared the discourse finished.
    pub fn is_final_answer(&self) -> bool {
        self.turn.utterance.contains(FINAL_ANSWER_MARKER)
    }
}

pub struct Discourse {
    topic: String,
    log: ConversationLog,
    engine: TurnPolicyEngine,
    moderator_override: ModeratorOverride,
    collaborators: Collaborators,
    usage: TokenUsage,
}

impl Discourse {
    pub fn new(topic: impl Into<String>, runner: &RunnerConfig, collaborators: Collaborators) -> Self {
        Self {
            topic: topic.into(),
            log: ConversationLog::new(),
            engine: TurnPolicyEngine::new(PolicyConfig::from(runner)),
            moderator_override: ModeratorOverride::new(),
            collaborators,
            usage: TokenUsage::default(),
        }
    }

    pub fn with_engine(mut self, engine: TurnPolicyEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn engine(&self) -> &TurnPolicyEngine {
        &self.engine
    }

    /// Usage summed over every turn so far.
    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    /// Store background knowledge. It reaches agents through the knowledge
    /// base only and never appears in the conversation log.
    pub async fn add_background(&self, text: &str) -> Result<(), SessionError> {
        let turn = Turn::new(SYSTEM_ROLE, text, UtteranceType::BackgroundInformation);
        self.collaborators.knowledge.insert(&turn).await?;
        Ok(())
    }

    /// Open the discourse with the user's question.
    pub async fn ask(&mut self, question: &str) -> Result<usize, SessionError> {
        self.record(Turn::new(
            SIMULATED_USER_ROLE,
            question,
            UtteranceType::OriginalQuestion,
        ))
        .await
    }

    /// Record a user utterance mid-discourse. The moderator takes the next turn.
    pub async fn interject(&mut self, utterance: &str) -> Result<usize, SessionError> {
        let index = self
            .record(Turn::new(
                SIMULATED_USER_ROLE,
                utterance,
                UtteranceType::InformationRequest,
            ))
            .await?;
        self.moderator_override.request();
        debug!(index, "User interjected, moderator requested");
        Ok(index)
    }

    /// Choose who speaks next. Rotates the roster and consumes the override.
    pub fn select_next(&mut self) -> Result<TurnDecision, SessionError> {
        let request = SelectRequest::new().with_override(&mut self.moderator_override);
        Ok(self.engine.select(&self.log, request)?)
    }

    /// Apply the side effects of `decision`, then let its agent speak.
    #[instrument(skip_all, fields(agent = %decision.agent.role_name()))]
    pub async fn take_turn(
        &mut self,
        decision: TurnDecision,
        cancel: &CancellationToken,
    ) -> Result<TurnRecord, SessionError> {
        if cancel.is_cancelled() {
            return Err(CollaboratorError::Cancelled.into());
        }

        if decision.update_expert_list {
            self.refresh_experts(cancel).await?;
        }

        if decision.reorganize_knowledge_base {
            trace!("Reorganizing knowledge base");
            self.collaborators
                .knowledge
                .reorganize(self.log.view(), cancel)
                .await?;
        }

        let agent = decision.agent;
        let generator = self.collaborators.utterances.as_ref();
        let mut generated = agent
            .produce_utterance(&self.topic, self.log.view(), generator, cancel)
            .await?;

        if decision.polish_utterance {
            let request = agent.request(&self.topic, self.log.view());
            let polished = generator.polish(&request, &generated.text, cancel).await?;
            generated = merge_usage(generated, polished);
        }

        let usage = generated.usage.map(|usage| {
            self.usage += usage;
            TokenUsageReport::new(agent.role_name(), usage, generated.model.clone())
        });

        let turn = Turn::new(agent.role_name(), generated.text, agent.utterance_type());
        let index = self.record(turn.clone()).await?;

        Ok(TurnRecord {
            index,
            agent,
            turn,
            usage,
        })
    }

    /// Select and take one turn.
    pub async fn step(&mut self, cancel: &CancellationToken) -> Result<TurnRecord, SessionError> {
        let decision = self.select_next()?;
        self.take_turn(decision, cancel).await
    }

    /// Condensed result of the discourse so far.
    pub async fn summarize(&self, cancel: &CancellationToken) -> Result<Generated, SessionError> {
        Ok(self
            .collaborators
            .utterances
            .summarize(&self.topic, self.log.view(), cancel)
            .await?)
    }

    async fn refresh_experts(&mut self, cancel: &CancellationToken) -> Result<(), SessionError> {
        let background = self.collaborators.knowledge.summary().await;
        let focus = self
            .log
            .last()
            .map(|turn| turn.utterance.clone())
            .unwrap_or_default();
        let descriptions = self
            .collaborators
            .experts
            .generate_experts(
                &self.topic,
                &background,
                &focus,
                self.engine.config().max_experts,
                cancel,
            )
            .await?;
        let kept = self.engine.update_roster(&descriptions);
        debug!(kept, proposed = descriptions.len(), "Expert roster refreshed");
        Ok(())
    }

    async fn record(&mut self, turn: Turn) -> Result<usize, SessionError> {
        self.collaborators.knowledge.insert(&turn).await?;
        Ok(self.log.append(turn))
    }
}

fn merge_usage(draft: Generated, polished: Generated) -> Generated {
    let usage = match (draft.usage, polished.usage) {
        (Some(mut a), Some(b)) => {
            a += b;
            Some(a)
        }
        (a, b) => a.or(b),
    };
    Generated {
        text: polished.text,
        usage,
        model: polished.model.or(draft.model),
    }
}
