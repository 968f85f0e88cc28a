// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for the codepilot control plane.
//!
//! Each subsystem owns a `thiserror` enum; `anyhow` is used at the binary and
//! routine boundary where errors are only reported, never matched on.

use thiserror::Error;

use crate::approval::ApprovalError;
use crate::channel::ChannelError;
use crate::policy::PolicyError;

/// Errors raised by external collaborators (generators, knowledge base, summarizer).
#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Knowledge base error: {0}")]
    KnowledgeBase(String),

    #[error("Repository summary failed: {0}")]
    Summary(String),

    #[error("User input unavailable: {0}")]
    UserInput(String),

    #[error("Operation cancelled")]
    Cancelled,
}

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("IO error reading config: {0}")]
    IoError(String),

    #[error("YAML parsing error: {0}")]
    YamlError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::IoError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::YamlError(err.to_string())
    }
}

/// Errors that end an orchestration session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid start message: {0}")]
    InvalidStart(String),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Turn policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Approval error: {0}")]
    Approval(#[from] ApprovalError),

    #[error("Routine task failed: {0}")]
    TaskFailed(String),
}

/// Result type alias using anyhow for flexible error handling.
pub type Result<T> = anyhow::Result<T>;
