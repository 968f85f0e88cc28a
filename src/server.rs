// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Accepting clients.
//!
//! `serve` listens on a Unix domain socket and runs one session per
//! connection. `serve_stdio` runs a single session over standard
//! input/output; logs go to stderr so stdout stays a clean channel.

use std::future::Future;
#[cfg(unix)]
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::channel::transport;
use crate::channel::{Channel, ChannelError};
use crate::collaborators::Collaborators;
use crate::config::ServerConfig;
use crate::error::SessionError;
use crate::orchestrate::SupervisorOutcome;
use crate::session::Session;

pub struct Server {
    config: ServerConfig,
    collaborators: Collaborators,
}

impl Server {
    pub fn new(config: ServerConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve until Ctrl-C.
    #[cfg(unix)]
    pub async fn serve(&self, socket_path: &Path) -> Result<(), ChannelError> {
        self.serve_until(socket_path, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Serve until `shutdown` resolves, then remove the socket file.
    ///
    /// Sessions still running at shutdown are left to finish on their own tasks.
    #[cfg(unix)]
    pub async fn serve_until<F>(&self, socket_path: &Path, shutdown: F) -> Result<(), ChannelError>
    where
        F: Future<Output = ()>,
    {
        let listener = transport::bind(socket_path)
            .await
            .map_err(|e| ChannelError::BindFailed(format!("{}: {}", socket_path.display(), e)))?;
        info!("Listening on {}", socket_path.display());

        tokio::pin!(shutdown);
        let result = loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(stream) => {
                        let channel = Channel::new(stream)
                            .with_reply_timeout(self.config.reply_timeout());
                        self.spawn_session(channel);
                    }
                    Err(e) => {
                        error!("Accept failed: {}", e);
                        break Err(ChannelError::AcceptFailed(e.to_string()));
                    }
                },
                _ = &mut shutdown => {
                    info!("Shutting down");
                    break Ok(());
                }
            }
        };

        if let Err(e) = transport::cleanup(socket_path) {
            warn!("Failed to remove socket {}: {}", socket_path.display(), e);
        }
        result
    }

    /// Run one session over stdin/stdout.
    pub async fn serve_stdio(&self) -> Result<SupervisorOutcome, SessionError> {
        let (reader, writer) = transport::stdio();
        let channel = Channel::from_parts(reader, writer)
            .with_reply_timeout(self.config.reply_timeout());
        Session::new(
            Arc::new(channel),
            self.config.clone(),
            self.collaborators.clone(),
        )
        .run()
        .await
    }

    fn spawn_session(&self, channel: Channel) {
        let channel = Arc::new(channel);
        let id = channel.id().to_string();
        let session = Session::new(channel, self.config.clone(), self.collaborators.clone());
        debug!(session = %id, "Connection accepted");

        tokio::spawn(async move {
            match session.run().await {
                Ok(outcome) => info!(session = %id, ?outcome, "Session finished"),
                Err(e) => warn!(session = %id, "Session ended with error: {}", e),
            }
        });
    }
}
