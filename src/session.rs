// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! One client session over a channel.
//!
//! The client opens with a `default` message carrying the request and an
//! optional `config` object. Everything after that is driven by the
//! supervised routine.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::channel::{Channel, MessageKind, TypedMessage};
use crate::collaborators::Collaborators;
use crate::config::{session_from_overrides, ServerConfig, SessionConfig};
use crate::error::SessionError;
use crate::orchestrate::{DiscourseRoutine, Supervisor, SupervisorOutcome};

/// Request text and options parsed from a start message.
#[derive(Debug, Clone, PartialEq)]
pub struct StartRequest {
    pub request: String,
    pub session: SessionConfig,
}

impl StartRequest {
    /// Parse a `default` message. Missing `config` fields take the given defaults.
    pub fn parse(message: &TypedMessage, defaults: &SessionConfig) -> Result<Self, SessionError> {
        let request = match message.content.as_str() {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            Some(_) => return Err(SessionError::InvalidStart("request is empty".to_string())),
            None => {
                return Err(SessionError::InvalidStart(
                    "content must be a string".to_string(),
                ))
            }
        };

        let session = session_from_overrides(defaults, message.field("config"))
            .map_err(|e| SessionError::InvalidStart(e.to_string()))?;

        Ok(Self { request, session })
    }
}

pub struct Session {
    channel: Arc<Channel>,
    config: ServerConfig,
    collaborators: Collaborators,
}

impl Session {
    pub fn new(channel: Arc<Channel>, config: ServerConfig, collaborators: Collaborators) -> Self {
        Self {
            channel,
            config,
            collaborators,
        }
    }

    /// Wait for the start message, then run the supervised routine.
    ///
    /// The channel is stopped when this returns, whatever the outcome.
    #[instrument(skip(self), fields(session = %self.channel.id()))]
    pub async fn run(self) -> Result<SupervisorOutcome, SessionError> {
        self.channel.start().await;

        let start = match self.channel.receive(MessageKind::Default).await {
            Ok(message) => message,
            Err(e) => {
                warn!("No start message: {}", e);
                self.channel.stop().await;
                return Err(e.into());
            }
        };

        let start = match StartRequest::parse(&start, &self.config.session) {
            Ok(start) => start,
            Err(e) => {
                warn!("Rejected start message: {}", e);
                if let Err(send_err) = self.channel.send(MessageKind::Error, e.to_string()).await {
                    warn!("Could not report rejected start: {}", send_err);
                }
                self.channel.stop().await;
                return Err(e);
            }
        };

        info!(
            root = %start.session.root_directory.display(),
            use_storm = start.session.use_storm,
            review = start.session.review,
            "Session started"
        );

        let routine = DiscourseRoutine::new(
            Arc::clone(&self.channel),
            self.collaborators,
            self.config.runner.clone(),
            start.session,
            start.request,
        );
        Supervisor::new(self.channel)
            .run(move |cancel| routine.run(cancel))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::decode;
    use serde_json::json;
    use std::path::PathBuf;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    #[test]
    fn test_parse_start_with_partial_config() {
        let message = TypedMessage::new("default", "add logging")
            .with_field("config", json!({"use_storm": false, "root_directory": "/srv/repo"}));
        let start = StartRequest::parse(&message, &SessionConfig::default()).unwrap();
        assert_eq!(start.request, "add logging");
        assert!(!start.session.use_storm);
        assert_eq!(start.session.root_directory, PathBuf::from("/srv/repo"));
        assert!(start.session.review);
        assert_eq!(start.session.max_iterations, 1);
    }

    #[test]
    fn test_parse_start_without_config() {
        let message = TypedMessage::new("default", "add logging");
        let start = StartRequest::parse(&message, &SessionConfig::default()).unwrap();
        assert_eq!(start.session, SessionConfig::default());
    }

    #[test]
    fn test_parse_start_rejects_bad_input() {
        let defaults = SessionConfig::default();

        let message = TypedMessage::new("default", json!({"not": "text"}));
        assert!(matches!(
            StartRequest::parse(&message, &defaults),
            Err(SessionError::InvalidStart(_))
        ));

        let message = TypedMessage::new("default", "  ");
        assert!(StartRequest::parse(&message, &defaults).is_err());

        let message = TypedMessage::new("default", "ok")
            .with_field("config", json!({"max_iterations": "many"}));
        assert!(StartRequest::parse(&message, &defaults).is_err());
    }

    #[tokio::test]
    async fn test_invalid_start_sends_one_error() {
        let (server, client) = tokio::io::duplex(4096);
        let channel = Arc::new(Channel::new(server));
        let session = Session::new(
            Arc::clone(&channel),
            ServerConfig::default(),
            Collaborators::offline(),
        );

        let (read, mut write) = tokio::io::split(client);
        write
            .write_all(b"{\"content\": \"fix it\", \"config\": {\"review\": \"sometimes\"}}\n")
            .await
            .unwrap();

        let result = session.run().await;
        assert!(matches!(result, Err(SessionError::InvalidStart(_))));
        assert!(channel.is_closed());

        let mut lines = BufReader::new(read).lines();
        let msg = decode(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert!(msg.is("error"));
        assert!(msg.content_str().starts_with("Invalid start message"));
    }

    #[tokio::test]
    async fn test_session_runs_to_completion() {
        let temp = tempfile::TempDir::new().unwrap();
        let (server, client) = tokio::io::duplex(64 * 1024);
        let channel = Arc::new(Channel::new(server));
        let session = Session::new(channel, ServerConfig::default(), Collaborators::offline());

        let (read, mut write) = tokio::io::split(client);
        let start = json!({
            "content": "tidy up",
            "config": {"use_storm": false, "root_directory": temp.path()},
        });
        write
            .write_all(format!("{}\n", start).as_bytes())
            .await
            .unwrap();

        let outcome = session.run().await.unwrap();
        assert!(matches!(outcome, SupervisorOutcome::Completed(_)));

        let mut lines = BufReader::new(read).lines();
        let mut kinds = Vec::new();
        loop {
            let msg = decode(&lines.next_line().await.unwrap().unwrap()).unwrap();
            kinds.push(msg.kind.clone());
            if msg.is("completed") {
                break;
            }
        }
        assert_eq!(kinds, vec!["log", "log", "completed"]);
    }
}
