// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! External collaborators of the control plane.
//!
//! Generation, retrieval and repository analysis happen outside the core.
//! The orchestration routine talks to them only through these traits, and
//! every call receives the session's [`CancellationToken`] so a `stop`
//! request can interrupt long-running work.
//!
//! [`offline`] provides implementations that need no model backend.

pub mod offline;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::agents::{AgentKind, AgentProfile};
use crate::approval::ProposedEdit;
use crate::conversation::Turn;
use crate::error::CollaboratorError;
use crate::types::TokenUsage;

/// Output of a generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generated {
    pub text: String,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
    #[serde(default)]
    pub model: Option<String>,
}

impl Generated {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
            model: None,
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage, model: impl Into<String>) -> Self {
        self.usage = Some(usage);
        self.model = Some(model.into());
        self
    }
}

/// Everything a generator needs to speak for one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct UtteranceRequest {
    pub topic: String,
    pub kind: AgentKind,
    pub profile: AgentProfile,
    pub intent: Option<String>,
    pub history: Vec<Turn>,
}

/// Request for code edits.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    pub task: String,
    pub context: String,
    pub review: bool,
    pub max_iterations: u32,
}

/// Produces agent utterances.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UtteranceGenerator: Send + Sync {
    async fn generate(
        &self,
        request: &UtteranceRequest,
        cancel: &CancellationToken,
    ) -> Result<Generated, CollaboratorError>;

    /// Rewrite a draft utterance for readability. Defaults to returning it as is.
    async fn polish(
        &self,
        _request: &UtteranceRequest,
        draft: &str,
        _cancel: &CancellationToken,
    ) -> Result<Generated, CollaboratorError> {
        Ok(Generated::text(draft))
    }

    /// Condense a finished discourse. Defaults to the last answering turn.
    async fn summarize(
        &self,
        topic: &str,
        history: &[Turn],
        _cancel: &CancellationToken,
    ) -> Result<Generated, CollaboratorError> {
        let text = history
            .iter()
            .rev()
            .find(|turn| !turn.is_questioning())
            .map(|turn| turn.utterance.clone())
            .unwrap_or_else(|| format!("No conclusions were reached on {}.", topic));
        Ok(Generated::text(text))
    }
}

/// Proposes a roster of peer experts as `"Name: description"` strings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExpertGenerator: Send + Sync {
    async fn generate_experts(
        &self,
        topic: &str,
        background: &str,
        focus: &str,
        count: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, CollaboratorError>;
}

/// Shared knowledge gathered during the discourse.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    async fn insert(&self, turn: &Turn) -> Result<(), CollaboratorError>;

    /// Reorganize stored knowledge against a read-only view of the conversation.
    async fn reorganize(
        &self,
        history: &[Turn],
        cancel: &CancellationToken,
    ) -> Result<(), CollaboratorError>;

    /// Condensed rendering used as background for expert generation.
    async fn summary(&self) -> String;
}

/// Free-text questions put to the user while work is in progress.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserPrompt: Send + Sync {
    /// Ask `question` and return the answer. An empty answer means the user
    /// gave none.
    async fn ask_user(&self, question: &str) -> Result<String, CollaboratorError>;
}

/// Produces proposed file edits for a task.
///
/// `user` lets the generator clarify the task with the user before
/// proposing anything.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EditGenerator: Send + Sync {
    async fn propose_edits(
        &self,
        request: &EditRequest,
        user: Arc<dyn UserPrompt>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ProposedEdit>, CollaboratorError>;
}

/// Summarizes the repository under a root directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepoSummarizer: Send + Sync {
    async fn summarize(
        &self,
        root: &Path,
        cancel: &CancellationToken,
    ) -> Result<String, CollaboratorError>;
}

/// The full set of collaborators a session runs with.
#[derive(Clone)]
pub struct Collaborators {
    pub utterances: Arc<dyn UtteranceGenerator>,
    pub experts: Arc<dyn ExpertGenerator>,
    pub knowledge: Arc<dyn KnowledgeBase>,
    pub edits: Arc<dyn EditGenerator>,
    pub summarizer: Arc<dyn RepoSummarizer>,
}

impl Collaborators {
    /// Collaborators that run without any model backend.
    pub fn offline() -> Self {
        Self {
            utterances: Arc::new(offline::TemplateUtterances),
            experts: Arc::new(offline::StaticExperts::default()),
            knowledge: Arc::new(offline::InMemoryKnowledgeBase::new()),
            edits: Arc::new(offline::NoEdits),
            summarizer: Arc::new(offline::FileTreeSummarizer::default()),
        }
    }

    /// Replace the edit generator.
    pub fn with_edits(mut self, edits: Arc<dyn EditGenerator>) -> Self {
        self.edits = edits;
        self
    }

    /// Replace the utterance generator.
    pub fn with_utterances(mut self, utterances: Arc<dyn UtteranceGenerator>) -> Self {
        self.utterances = utterances;
        self
    }

    /// Replace the repository summarizer.
    pub fn with_summarizer(mut self, summarizer: Arc<dyn RepoSummarizer>) -> Self {
        self.summarizer = summarizer;
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
