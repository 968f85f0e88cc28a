// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Races an orchestration routine against a client `stop` request.

use std::future::Future;
use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::channel::{Channel, ChannelResult, MessageKind, TypedMessage};
use crate::error::SessionError;

/// Log line sent when the user stops a running routine.
pub const CANCELLED_MESSAGE: &str = "Operation cancelled by user.";

/// How a supervised routine ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorOutcome {
    /// The routine finished; carries its summary.
    Completed(String),
    /// A `stop` message arrived first.
    Cancelled,
}

enum Race {
    Routine(Result<anyhow::Result<String>, JoinError>),
    Stopped,
}

/// Runs one routine and one stop listener, and reports whichever wins.
///
/// Exactly one of `completed` or the cancellation log is sent. The channel
/// is stopped and both tasks are gone when [`Supervisor::run`] returns.
pub struct Supervisor {
    channel: Arc<Channel>,
    cancel: CancellationToken,
}

impl Supervisor {
    pub fn new(channel: Arc<Channel>) -> Self {
        Self {
            channel,
            cancel: CancellationToken::new(),
        }
    }

    /// Token handed to the routine; cancelled when `stop` wins.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run<F, Fut>(self, routine: F) -> Result<SupervisorOutcome, SessionError>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
    {
        let mut routine_task = tokio::spawn(routine(self.cancel.clone()));
        let mut stop_task = spawn_stop_listener(Arc::clone(&self.channel));

        let race = tokio::select! {
            joined = &mut routine_task => Race::Routine(joined),
            stopped = &mut stop_task => match stopped {
                Ok(Ok(_)) => Race::Stopped,
                Ok(Err(e)) => {
                    debug!("Stop listener ended: {}", e);
                    Race::Routine((&mut routine_task).await)
                }
                Err(e) => {
                    warn!("Stop listener failed: {}", e);
                    Race::Routine((&mut routine_task).await)
                }
            },
        };

        let result = match race {
            Race::Stopped => {
                info!("Stop requested, cancelling routine");
                self.cancel.cancel();
                routine_task.abort();
                if let Err(e) = (&mut routine_task).await {
                    if e.is_panic() {
                        warn!("Routine panicked while cancelling: {}", e);
                    }
                }
                self.notify(MessageKind::Log, CANCELLED_MESSAGE).await;
                Ok(SupervisorOutcome::Cancelled)
            }
            Race::Routine(Ok(Ok(summary))) => {
                stop_task.abort();
                info!("Routine completed");
                self.notify(MessageKind::Completed, &summary).await;
                Ok(SupervisorOutcome::Completed(summary))
            }
            Race::Routine(Ok(Err(e))) => {
                stop_task.abort();
                error!("Routine failed: {:#}", e);
                self.notify(MessageKind::Error, &format!("Error during orchestration: {}", e))
                    .await;
                Err(match e.downcast::<SessionError>() {
                    Ok(session_error) => session_error,
                    Err(other) => SessionError::TaskFailed(format!("{:#}", other)),
                })
            }
            Race::Routine(Err(e)) => {
                stop_task.abort();
                error!("Routine task failed: {}", e);
                self.notify(MessageKind::Error, &format!("Error during orchestration: {}", e))
                    .await;
                Err(SessionError::TaskFailed(e.to_string()))
            }
        };

        stop_task.abort();
        routine_task.abort();
        self.channel.stop().await;
        result
    }

    async fn notify(&self, kind: MessageKind, content: &str) {
        if let Err(e) = self.channel.send(kind, content).await {
            warn!(kind = %kind, "Could not deliver message: {}", e);
        }
    }
}

fn spawn_stop_listener(channel: Arc<Channel>) -> JoinHandle<ChannelResult<TypedMessage>> {
    tokio::spawn(async move { channel.receive_timeout(MessageKind::Stop, None).await })
}
