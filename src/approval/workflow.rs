// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Human approval of proposed edits over the channel.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::diff::{unified_diff, DEFAULT_CONTEXT_LINES};
use super::machine::{ApprovalError, ApprovalMachine, Prompt, Step};
use super::persist::{resolve_path, write_file};
use super::types::{EditOutcome, ProposedEdit};
use crate::channel::{Channel, MessageKind, TypedMessage};
use crate::collaborators::{RepoSummarizer, UserPrompt};
use crate::error::CollaboratorError;

/// Drives the accept/discard/feedback dialogue for each proposed edit.
///
/// Accepted edits are written under the root directory and the cached
/// repository summary is refreshed so later edits see the new state.
pub struct ApprovalWorkflow {
    channel: Arc<Channel>,
    root: PathBuf,
    summarizer: Arc<dyn RepoSummarizer>,
    cancel: CancellationToken,
    repo_summary: String,
}

impl ApprovalWorkflow {
    pub fn new(
        channel: Arc<Channel>,
        root: impl Into<PathBuf>,
        summarizer: Arc<dyn RepoSummarizer>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            channel,
            root: root.into(),
            summarizer,
            cancel,
            repo_summary: String::new(),
        }
    }

    pub fn with_repo_summary(mut self, summary: impl Into<String>) -> Self {
        self.repo_summary = summary.into();
        self
    }

    /// Latest repository summary.
    pub fn repo_summary(&self) -> &str {
        &self.repo_summary
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Review one edit to a terminal decision, persisting it if accepted.
    #[instrument(skip(self, edit), fields(file = %edit.filename))]
    pub async fn review(&mut self, edit: &ProposedEdit) -> Result<EditOutcome, ApprovalError> {
        let filename = edit.filename.as_str();
        let diff = render_diff(edit).await?;
        self.channel.send(MessageKind::Diff, diff).await?;

        let mut machine = ApprovalMachine::new();
        let mut prompt = Prompt::Choice;

        let decision = loop {
            self.channel.send(prompt.kind(), prompt.text(filename)).await?;
            let reply = wait_for(&self.channel, &self.cancel, prompt.kind()).await?;
            let input = reply.content_str();

            match machine.apply(&input)? {
                Step::Prompt(next) => {
                    if next == Prompt::FinalChoice {
                        let feedback = input.trim();
                        info!(feedback, "Feedback received");
                        self.channel
                            .send(
                                MessageKind::Log,
                                format!("User feedback for {}: {}", filename, feedback),
                            )
                            .await?;
                    }
                    prompt = next;
                }
                Step::Invalid { input, prompt: same } => {
                    debug!(input = %input, "Invalid choice");
                    self.channel
                        .send(MessageKind::Log, same.invalid_text(&input))
                        .await?;
                    prompt = same;
                }
                Step::Decided(decision) => break decision,
            }
        };

        let mut outcome = EditOutcome {
            filename: edit.filename.clone(),
            decision,
            write_error: None,
        };

        if outcome.decision.is_accepted() {
            let written = match resolve_path(&self.root, filename) {
                Ok(path) => write_file(path, edit.updated_content.clone()).await,
                Err(e) => Err(e),
            };
            match written {
                Ok(()) => self.refresh_summary().await,
                Err(e) => {
                    warn!(error = %e, "Failed to persist accepted edit");
                    outcome.write_error = Some(e.to_string());
                }
            }
        }

        info!(decision = ?outcome.decision, applied = outcome.applied(), "Edit reviewed");
        Ok(outcome)
    }

    /// Review edits one after another.
    ///
    /// A failed write is recorded on its outcome and the batch moves on; only
    /// channel failures and cancellation stop it. A combined summary is sent
    /// as a `log` message at the end.
    pub async fn review_batch(
        &mut self,
        edits: &[ProposedEdit],
    ) -> Result<Vec<EditOutcome>, ApprovalError> {
        let mut outcomes = Vec::with_capacity(edits.len());
        for edit in edits {
            outcomes.push(self.review(edit).await?);
        }

        let summary = outcomes
            .iter()
            .map(EditOutcome::summary)
            .collect::<Vec<_>>()
            .join("\n");
        self.channel
            .send(MessageKind::Log, format!("[Review] {}", summary))
            .await?;

        Ok(outcomes)
    }

    /// Ask the user a free-text question. See [`ChannelQuestions::ask`].
    pub async fn ask_user(&self, question: &str) -> Result<String, ApprovalError> {
        self.questions().ask(question).await
    }

    /// Question asker sharing this workflow's channel and cancellation.
    pub fn questions(&self) -> ChannelQuestions {
        ChannelQuestions::new(Arc::clone(&self.channel), self.cancel.clone())
    }

    async fn refresh_summary(&mut self) {
        match self.summarizer.summarize(&self.root, &self.cancel).await {
            Ok(summary) => {
                debug!(bytes = summary.len(), "Repository summary refreshed");
                self.repo_summary = summary;
            }
            Err(e) => warn!(error = %e, "Failed to refresh repository summary"),
        }
    }
}

/// Free-text questions to the user over the channel.
#[derive(Clone)]
pub struct ChannelQuestions {
    channel: Arc<Channel>,
    cancel: CancellationToken,
}

impl ChannelQuestions {
    pub fn new(channel: Arc<Channel>, cancel: CancellationToken) -> Self {
        Self { channel, cancel }
    }

    /// Send `question` and wait for the `question` reply.
    ///
    /// Returns an empty answer, after reporting an `error` message, if no
    /// reply can be obtained.
    pub async fn ask(&self, question: &str) -> Result<String, ApprovalError> {
        self.channel.send(MessageKind::Question, question).await?;
        match wait_for(&self.channel, &self.cancel, MessageKind::Question).await {
            Ok(reply) => Ok(reply.content_str()),
            Err(ApprovalError::Cancelled) => Err(ApprovalError::Cancelled),
            Err(e) => {
                let reason = match e {
                    ApprovalError::Channel(inner) => inner.to_string(),
                    other => other.to_string(),
                };
                warn!(reason = %reason, "No answer to question");
                let _ = self
                    .channel
                    .send(
                        MessageKind::Error,
                        format!("Error getting user response: {}", reason),
                    )
                    .await;
                Ok(String::new())
            }
        }
    }
}

#[async_trait]
impl UserPrompt for ChannelQuestions {
    async fn ask_user(&self, question: &str) -> Result<String, CollaboratorError> {
        self.ask(question).await.map_err(|e| match e {
            ApprovalError::Cancelled => CollaboratorError::Cancelled,
            other => CollaboratorError::UserInput(other.to_string()),
        })
    }
}

async fn wait_for(
    channel: &Channel,
    cancel: &CancellationToken,
    kind: MessageKind,
) -> Result<TypedMessage, ApprovalError> {
    tokio::select! {
        reply = channel.receive(kind) => Ok(reply?),
        _ = cancel.cancelled() => Err(ApprovalError::Cancelled),
    }
}

async fn render_diff(edit: &ProposedEdit) -> Result<String, ApprovalError> {
    let old = edit.original_content.clone();
    let new = edit.updated_content.clone();
    let filename = edit.filename.clone();
    tokio::task::spawn_blocking(move || unified_diff(&old, &new, &filename, DEFAULT_CONTEXT_LINES))
        .await
        .map_err(|e| ApprovalError::Render(e.to_string()))
}
