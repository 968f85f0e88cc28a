// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Integration tests for the approval workflow over a live channel.

mod common;

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use codepilot::approval::{ApprovalWorkflow, Decision, ProposedEdit};
use codepilot::channel::Channel;
use codepilot::collaborators::RepoSummarizer;
use codepilot::error::CollaboratorError;

use common::{connected, pair, TestClient};

/// Summarizer that counts refreshes.
#[derive(Default)]
struct CountingSummarizer {
    calls: AtomicUsize,
}

#[async_trait]
impl RepoSummarizer for CountingSummarizer {
    async fn summarize(
        &self,
        _root: &Path,
        _cancel: &CancellationToken,
    ) -> Result<String, CollaboratorError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("summary #{}", n))
    }
}

fn workflow(channel: Arc<Channel>, root: &Path, summarizer: Arc<CountingSummarizer>) -> ApprovalWorkflow {
    ApprovalWorkflow::new(channel, root, summarizer, CancellationToken::new())
}

async fn answer_choice(client: &mut TestClient, reply: &str) {
    let prompt = client.next().await;
    assert!(prompt.is("confirmation"), "expected confirmation, got {:?}", prompt);
    client.send("confirmation", reply).await;
}

// ============================================================================
// Decisions
// ============================================================================

#[tokio::test]
async fn test_diff_is_sent_before_prompt() {
    let temp = TempDir::new().unwrap();
    let (channel, mut client) = connected().await;
    let summarizer = Arc::new(CountingSummarizer::default());
    let mut workflow = workflow(channel, temp.path(), Arc::clone(&summarizer));

    let edit = ProposedEdit::new("notes.txt", "alpha\nbeta\n", "alpha\ngamma\n");
    let task = tokio::spawn(async move { workflow.review(&edit).await.unwrap() });

    let diff = client.next().await;
    assert!(diff.is("diff"));
    assert_eq!(
        diff.content_str(),
        "--- notes.txt\n+++ notes.txt\n@@ -1,2 +1,2 @@\n alpha\n-beta\n+gamma"
    );
    answer_choice(&mut client, "n").await;

    let outcome = task.await.unwrap();
    assert_eq!(outcome.decision, Decision::Discarded);
    assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_feedback_then_accept_writes_file() {
    let temp = TempDir::new().unwrap();
    let (channel, mut client) = connected().await;
    let summarizer = Arc::new(CountingSummarizer::default());
    let mut workflow = workflow(channel, temp.path(), Arc::clone(&summarizer));

    let edit = ProposedEdit::new("src/retry.rs", "", "pub fn retry() {}\n");
    let task = tokio::spawn(async move {
        let outcome = workflow.review(&edit).await.unwrap();
        (outcome, workflow.repo_summary().to_string())
    });

    client.next().await; // diff
    answer_choice(&mut client, "F").await;

    let question = client.next().await;
    assert!(question.is("question"));
    client.send("question", "add jitter later").await;

    let log = client.next().await;
    assert_eq!(log.content_str(), "User feedback for src/retry.rs: add jitter later");
    answer_choice(&mut client, "y").await;

    let (outcome, summary) = task.await.unwrap();
    assert_eq!(
        outcome.decision,
        Decision::AcceptedWithFeedback {
            feedback: "add jitter later".into()
        }
    );
    assert_eq!(
        outcome.summary(),
        "Updated src/retry.rs. Feedback provided: add jitter later"
    );
    assert_eq!(
        std::fs::read_to_string(temp.path().join("src/retry.rs")).unwrap(),
        "pub fn retry() {}\n"
    );
    assert_eq!(summary, "summary #1");
}

#[tokio::test]
async fn test_invalid_final_choice_reprompts() {
    let temp = TempDir::new().unwrap();
    let (channel, mut client) = connected().await;
    let mut workflow = workflow(channel, temp.path(), Arc::new(CountingSummarizer::default()));

    let edit = ProposedEdit::new("x.txt", "", "x");
    let task = tokio::spawn(async move { workflow.review(&edit).await.unwrap() });

    client.next().await; // diff
    answer_choice(&mut client, "f").await;
    client.next().await; // feedback question
    client.send("question", "needs tests").await;
    client.next().await; // feedback log

    answer_choice(&mut client, "later").await;
    let log = client.next().await;
    assert_eq!(log.content_str(), "Invalid choice 'later'. Please enter 'y' or 'n'.");

    answer_choice(&mut client, "n").await;
    let outcome = task.await.unwrap();
    assert_eq!(
        outcome.decision,
        Decision::DiscardedWithFeedback {
            feedback: "needs tests".into()
        }
    );
    assert!(!temp.path().join("x.txt").exists());
}

// ============================================================================
// Batches
// ============================================================================

#[tokio::test]
async fn test_batch_reports_every_outcome() {
    let temp = TempDir::new().unwrap();
    let (channel, mut client) = connected().await;
    let summarizer = Arc::new(CountingSummarizer::default());
    let mut workflow = workflow(channel, temp.path(), Arc::clone(&summarizer));

    let edits = vec![
        ProposedEdit::new("a.txt", "", "a"),
        ProposedEdit::new("b.txt", "", "b"),
        ProposedEdit::new("c.txt", "", "c"),
    ];
    let task = tokio::spawn(async move { workflow.review_batch(&edits).await.unwrap() });

    client.next().await;
    answer_choice(&mut client, "y").await;
    client.next().await;
    answer_choice(&mut client, "n").await;
    client.next().await;
    answer_choice(&mut client, "y").await;

    let review = client.next().await;
    assert!(review.is("log"));
    assert_eq!(
        review.content_str(),
        "[Review] Updated a.txt.\nDiscarded update for b.txt.\nUpdated c.txt."
    );

    let outcomes = task.await.unwrap();
    assert_eq!(outcomes.iter().filter(|o| o.applied()).count(), 2);
    assert_eq!(summarizer.calls.load(Ordering::SeqCst), 2);
}

// ============================================================================
// Free-text questions
// ============================================================================

#[tokio::test]
async fn test_ask_user_timeout_reports_error_and_returns_empty() {
    let temp = TempDir::new().unwrap();
    let (channel, mut client) = pair();
    let channel = Arc::new(channel.with_reply_timeout(Some(Duration::from_millis(30))));
    channel.start().await;
    let workflow = workflow(channel, temp.path(), Arc::new(CountingSummarizer::default()));

    let answer = workflow.ask_user("Which crate?").await.unwrap();
    assert_eq!(answer, "");

    let question = client.next().await;
    assert!(question.is("question"));
    let error = client.next().await;
    assert!(error.is("error"));
    assert!(error
        .content_str()
        .starts_with("Error getting user response: Timed out"));
}
