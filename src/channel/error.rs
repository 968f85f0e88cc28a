// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Channel error types.

use std::io;
use thiserror::Error;

/// Errors that can occur on the typed message channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Failed to bind the listening endpoint.
    #[error("Failed to bind channel endpoint: {0}")]
    BindFailed(String),

    /// Failed to accept an incoming connection.
    #[error("Failed to accept channel connection: {0}")]
    AcceptFailed(String),

    /// Failed to write a message to the transport.
    #[error("Failed to write to channel: {0}")]
    WriteFailed(String),

    /// Failed to encode or decode a message.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The channel has shut down and the requested queue is empty.
    #[error("Channel closed")]
    Closed,

    /// No message of the requested type arrived in time.
    #[error("Timed out waiting for '{0}' message")]
    Timeout(String),

    /// General transport error.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ChannelError {
    /// Create a transport error from an IO error with context.
    pub fn from_io_error(context: &str, err: io::Error) -> Self {
        ChannelError::Transport(format!("{}: {}", context, err))
    }

    /// Whether this error means the peer is gone for good.
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            ChannelError::Closed | ChannelError::WriteFailed(_) | ChannelError::Transport(_)
        )
    }
}

impl From<serde_json::Error> for ChannelError {
    fn from(err: serde_json::Error) -> Self {
        ChannelError::Serialization(err.to_string())
    }
}

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;
