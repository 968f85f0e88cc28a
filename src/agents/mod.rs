// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Discourse participants.
//!
//! The set of participants is closed: a simulated user, a retrieval-only
//! baseline agent, the moderator, peer experts drawn from the roster, and a
//! general knowledge provider. Content is produced by an
//! [`UtteranceGenerator`]; the agent only supplies its profile and the kind of
//! utterance it contributes.

mod roster;

pub use roster::PeerRoster;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::collaborators::{Generated, UtteranceGenerator, UtteranceRequest};
use crate::conversation::{Turn, UtteranceType};
use crate::error::CollaboratorError;

pub const SIMULATED_USER_ROLE: &str = "Guest";
pub const PURE_RAG_ROLE: &str = "PureRAG";
pub const MODERATOR_ROLE: &str = "Moderator";
pub const GENERAL_KNOWLEDGE_ROLE: &str = "General Knowledge Provider";
pub const GENERAL_KNOWLEDGE_DESCRIPTION: &str = "Focus on broadly covering basic facts.";

/// Name and focus of a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub role_name: String,
    pub role_description: String,
}

impl AgentProfile {
    pub fn new(role_name: impl Into<String>, role_description: impl Into<String>) -> Self {
        Self {
            role_name: role_name.into(),
            role_description: role_description.into(),
        }
    }

    /// Parse a `"Name: description"` string. Text without a colon is all name.
    pub fn parse(description: &str) -> Option<Self> {
        let description = description.trim();
        if description.is_empty() {
            return None;
        }
        let (name, focus) = description.split_once(':').unwrap_or((description, ""));
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self::new(name, focus.trim()))
    }
}

/// Discriminant of [`Agent`], used in requests and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    SimulatedUser,
    PureRag,
    Moderator,
    PeerExpert,
    GeneralKnowledgeProvider,
}

/// A discourse participant selected by the turn policy.
#[derive(Debug, Clone, PartialEq)]
pub enum Agent {
    SimulatedUser {
        profile: AgentProfile,
        intent: Option<String>,
    },
    PureRag(AgentProfile),
    Moderator(AgentProfile),
    PeerExpert(AgentProfile),
    GeneralKnowledgeProvider(AgentProfile),
}

impl Agent {
    pub fn simulated_user(intent: Option<String>) -> Self {
        Agent::SimulatedUser {
            profile: AgentProfile::new(SIMULATED_USER_ROLE, ""),
            intent,
        }
    }

    pub fn pure_rag() -> Self {
        Agent::PureRag(AgentProfile::new(PURE_RAG_ROLE, ""))
    }

    pub fn moderator() -> Self {
        Agent::Moderator(AgentProfile::new(MODERATOR_ROLE, ""))
    }

    pub fn general_knowledge_provider() -> Self {
        Agent::GeneralKnowledgeProvider(AgentProfile::new(
            GENERAL_KNOWLEDGE_ROLE,
            GENERAL_KNOWLEDGE_DESCRIPTION,
        ))
    }

    pub fn peer_expert(profile: AgentProfile) -> Self {
        Agent::PeerExpert(profile)
    }

    pub fn kind(&self) -> AgentKind {
        match self {
            Agent::SimulatedUser { .. } => AgentKind::SimulatedUser,
            Agent::PureRag(_) => AgentKind::PureRag,
            Agent::Moderator(_) => AgentKind::Moderator,
            Agent::PeerExpert(_) => AgentKind::PeerExpert,
            Agent::GeneralKnowledgeProvider(_) => AgentKind::GeneralKnowledgeProvider,
        }
    }

    pub fn profile(&self) -> &AgentProfile {
        match self {
            Agent::SimulatedUser { profile, .. }
            | Agent::PureRag(profile)
            | Agent::Moderator(profile)
            | Agent::PeerExpert(profile)
            | Agent::GeneralKnowledgeProvider(profile) => profile,
        }
    }

    pub fn role_name(&self) -> &str {
        &self.profile().role_name
    }

    pub fn role_description(&self) -> &str {
        &self.profile().role_description
    }

    /// Intent carried by a simulated user, if any.
    pub fn intent(&self) -> Option<&str> {
        match self {
            Agent::SimulatedUser { intent, .. } => intent.as_deref(),
            _ => None,
        }
    }

    /// Utterance type recorded for this agent's turns.
    ///
    /// The moderator and the simulated user ask; everyone else answers.
    pub fn utterance_type(&self) -> UtteranceType {
        match self {
            Agent::SimulatedUser { .. } | Agent::Moderator(_) => UtteranceType::InformationRequest,
            _ => UtteranceType::Response,
        }
    }

    /// Produce this agent's next utterance given the conversation so far.
    pub async fn produce_utterance(
        &self,
        topic: &str,
        history: &[Turn],
        generator: &dyn UtteranceGenerator,
        cancel: &CancellationToken,
    ) -> Result<Generated, CollaboratorError> {
        if cancel.is_cancelled() {
            return Err(CollaboratorError::Cancelled);
        }
        generator.generate(&self.request(topic, history), cancel).await
    }

    /// Generation request describing this agent at this point in the conversation.
    pub fn request(&self, topic: &str, history: &[Turn]) -> UtteranceRequest {
        UtteranceRequest {
            topic: topic.to_string(),
            kind: self.kind(),
            profile: self.profile().clone(),
            intent: self.intent().map(str::to_string),
            history: history.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::MockUtteranceGenerator;

    #[test]
    fn test_profile_parse() {
        let profile = AgentProfile::parse("Security Reviewer: Focus on input validation.").unwrap();
        assert_eq!(profile.role_name, "Security Reviewer");
        assert_eq!(profile.role_description, "Focus on input validation.");

        let profile = AgentProfile::parse("  Tester  ").unwrap();
        assert_eq!(profile.role_name, "Tester");
        assert_eq!(profile.role_description, "");

        // Only the first colon separates name from description
        let profile = AgentProfile::parse("Ops: note: keep it small").unwrap();
        assert_eq!(profile.role_description, "note: keep it small");

        assert!(AgentProfile::parse("   ").is_none());
        assert!(AgentProfile::parse(": no name").is_none());
    }

    #[test]
    fn test_default_roles() {
        assert_eq!(Agent::simulated_user(None).role_name(), "Guest");
        assert_eq!(Agent::pure_rag().role_name(), "PureRAG");
        assert_eq!(Agent::moderator().role_name(), "Moderator");

        let gkp = Agent::general_knowledge_provider();
        assert_eq!(gkp.role_name(), "General Knowledge Provider");
        assert_eq!(gkp.role_description(), "Focus on broadly covering basic facts.");
        assert_eq!(gkp.kind(), AgentKind::GeneralKnowledgeProvider);
    }

    #[test]
    fn test_utterance_types() {
        assert_eq!(
            Agent::moderator().utterance_type(),
            UtteranceType::InformationRequest
        );
        assert_eq!(
            Agent::simulated_user(Some("ask more".into())).utterance_type(),
            UtteranceType::InformationRequest
        );
        assert_eq!(
            Agent::peer_expert(AgentProfile::new("Architect", "")).utterance_type(),
            UtteranceType::Response
        );
    }

    #[tokio::test]
    async fn test_produce_utterance_passes_profile_and_intent() {
        let mut generator = MockUtteranceGenerator::new();
        generator
            .expect_generate()
            .withf(|request, _| {
                request.kind == AgentKind::SimulatedUser
                    && request.intent.as_deref() == Some("dig deeper")
                    && request.history.len() == 1
            })
            .times(1)
            .returning(|_, _| Ok(Generated::text("Can you dig deeper?")));

        let history = vec![Turn::new("Guest", "q", UtteranceType::OriginalQuestion)];
        let agent = Agent::simulated_user(Some("dig deeper".into()));
        let generated = agent
            .produce_utterance("topic", &history, &generator, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(generated.text, "Can you dig deeper?");
    }

    #[tokio::test]
    async fn test_produce_utterance_respects_cancellation() {
        let generator = MockUtteranceGenerator::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = Agent::moderator()
            .produce_utterance("topic", &[], &generator, &cancel)
            .await;
        assert!(matches!(result, Err(CollaboratorError::Cancelled)));
    }
}
