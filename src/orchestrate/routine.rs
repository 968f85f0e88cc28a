// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The orchestration routine run under a [`Supervisor`](super::Supervisor).
//!
//! Summarize the repository, optionally hold a multi-agent discourse about
//! the request, ask for edits and take every proposed edit through human
//! approval.

use std::sync::Arc;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use super::discourse::Discourse;
use crate::approval::{ApprovalWorkflow, ChannelQuestions};
use crate::channel::{Channel, ChannelError, MessageKind};
use crate::collaborators::{Collaborators, EditRequest};
use crate::config::{RunnerConfig, SessionConfig};
use crate::error::{CollaboratorError, SessionError};

/// Characters of each utterance echoed in per-turn log lines.
const PREVIEW_CHARS: usize = 100;

/// What the discourse contributed to edit generation.
#[derive(Debug, Clone, Default)]
pub struct DiscourseReport {
    /// Turns taken, not counting the opening question.
    pub turns: usize,
    pub transcript: String,
    pub final_summary: String,
}

pub struct DiscourseRoutine {
    channel: Arc<Channel>,
    collaborators: Collaborators,
    runner: RunnerConfig,
    session: SessionConfig,
    request: String,
}

impl DiscourseRoutine {
    pub fn new(
        channel: Arc<Channel>,
        collaborators: Collaborators,
        mut runner: RunnerConfig,
        session: SessionConfig,
        request: impl Into<String>,
    ) -> Self {
        let request = request.into();
        if runner.topic.trim().is_empty() {
            runner.topic = request.clone();
        }
        Self {
            channel,
            collaborators,
            runner,
            session,
            request,
        }
    }

    pub fn topic(&self) -> &str {
        &self.runner.topic
    }

    /// Run to completion and return the summary sent with `completed`.
    #[instrument(skip_all, fields(channel = %self.channel.id()))]
    pub async fn run(self, cancel: CancellationToken) -> anyhow::Result<String> {
        Ok(self.execute(&cancel).await?)
    }

    async fn execute(&self, cancel: &CancellationToken) -> Result<String, SessionError> {
        let mode = if self.session.use_storm {
            "with collaborative discourse"
        } else {
            "with direct edit generation"
        };
        self.log(format!("Starting orchestration {}.", mode)).await?;

        let root = self.session.root_directory.clone();
        let repo_summary = self.collaborators.summarizer.summarize(&root, cancel).await?;

        let report = if self.session.use_storm {
            Some(self.discuss(&repo_summary, cancel).await?)
        } else {
            None
        };

        let edit_request = EditRequest {
            task: self.request.clone(),
            context: edit_context(&repo_summary, &self.request, report.as_ref()),
            review: self.session.review,
            max_iterations: self.session.max_iterations,
        };
        let questions = ChannelQuestions::new(Arc::clone(&self.channel), cancel.clone());
        let edits = self
            .collaborators
            .edits
            .propose_edits(&edit_request, Arc::new(questions), cancel)
            .await?;

        if edits.is_empty() {
            self.log("No edits proposed.").await?;
            return Ok("Orchestration completed. No edits were proposed.".to_string());
        }

        info!(count = edits.len(), "Reviewing proposed edits");
        let mut workflow = ApprovalWorkflow::new(
            Arc::clone(&self.channel),
            root,
            Arc::clone(&self.collaborators.summarizer),
            cancel.clone(),
        )
        .with_repo_summary(repo_summary);
        let outcomes = workflow.review_batch(&edits).await?;
        let applied = outcomes.iter().filter(|outcome| outcome.applied()).count();

        Ok(format!(
            "Orchestration completed. {} of {} edits applied.",
            applied,
            outcomes.len()
        ))
    }

    /// Hold the discourse and report it over the channel.
    async fn discuss(
        &self,
        repo_summary: &str,
        cancel: &CancellationToken,
    ) -> Result<DiscourseReport, SessionError> {
        let mut discourse = Discourse::new(
            self.runner.topic.clone(),
            &self.runner,
            self.collaborators.clone(),
        );
        discourse
            .add_background(&format!("Repository Context:\n{}", repo_summary))
            .await?;
        discourse.ask(&self.request).await?;

        let mut turns = 0;
        for i in 1..=self.runner.total_conv_turn {
            if cancel.is_cancelled() {
                return Err(CollaboratorError::Cancelled.into());
            }

            let decision = discourse.select_next()?;
            self.log(format!(
                "[Turn {}] Selected agent: {}",
                i,
                decision.agent.role_name()
            ))
            .await?;

            let record = discourse.take_turn(decision, cancel).await?;
            turns = i;

            if let Some(report) = &record.usage {
                let payload = serde_json::to_value(report).map_err(ChannelError::from)?;
                self.channel.send(MessageKind::TokenUsage, payload).await?;
            }

            self.log(format!(
                "[Turn {}: {}] {}",
                i,
                record.turn.role,
                record.turn.preview(PREVIEW_CHARS)
            ))
            .await?;

            if record.is_final_answer() {
                info!(turn = i, "Final answer reached");
                break;
            }
        }

        let summary = discourse.summarize(cancel).await?;
        self.log(format!("[Final Summary] {}", summary.text)).await?;

        let usage = discourse.usage();
        let experts: Vec<String> = discourse
            .engine()
            .experts()
            .into_iter()
            .map(|profile| profile.role_name)
            .collect();
        self.channel
            .send(
                MessageKind::Usage,
                json!({
                    "turns": turns,
                    "input_tokens": usage.input_tokens,
                    "output_tokens": usage.output_tokens,
                    "total_tokens": usage.total(),
                    "experts": experts,
                }),
            )
            .await?;

        Ok(DiscourseReport {
            turns,
            transcript: discourse.log().transcript(),
            final_summary: summary.text,
        })
    }

    async fn log(&self, text: impl Into<String>) -> Result<(), SessionError> {
        Ok(self.channel.send(MessageKind::Log, text.into()).await?)
    }
}

/// Context handed to the edit generator.
fn edit_context(repo_summary: &str, request: &str, report: Option<&DiscourseReport>) -> String {
    let mut context = format!(
        "Repository Context:\n{}\n\nOriginal User Request:\n{}",
        repo_summary, request
    );
    if let Some(report) = report {
        context.push_str(&format!(
            "\n\nCollaborative Expert Analysis:\n{}\n\n{}",
            report.final_summary, report.transcript
        ));
    }
    context
}
