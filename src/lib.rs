// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Codepilot - a human-in-the-loop control plane for multi-agent code assistance.
//!
//! A client connects over a typed message channel and sends a request. A
//! panel of agents discusses it, an edit generator proposes changes, and
//! every change waits for the human to accept, discard, or comment on it
//! before anything touches the filesystem. The client can send `stop` at
//! any moment.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`channel`] - Type-multiplexed duplex channel over NDJSON
//! - [`conversation`] - Append-only conversation log and turn types
//! - [`agents`] - Agent variants and the peer-expert roster
//! - [`policy`] - Turn policy engine deciding who speaks next
//! - [`approval`] - Diff rendering, the y/n/f approval machine and persistence
//! - [`orchestrate`] - Discourse routine and the stop-aware supervisor
//! - [`collaborators`] - Traits for generation, retrieval and repository summaries
//! - [`session`] / [`server`] - Per-connection sessions and listeners
//! - [`config`] - Configuration loading and merging
//! - [`telemetry`] - Structured logging
//! - [`types`] / [`error`] - Shared types and error enums
//!
//! # Example
//!
//! ```rust,ignore
//! use codepilot::collaborators::Collaborators;
//! use codepilot::config::{load_config, CliOptions};
//! use codepilot::server::Server;
//!
//! let config = load_config(".".as_ref(), None, &CliOptions::default())?;
//! Server::new(config, Collaborators::offline())
//!     .serve("/tmp/codepilot.sock".as_ref())
//!     .await?;
//! ```

pub mod agents;
pub mod approval;
pub mod channel;
pub mod collaborators;
pub mod config;
pub mod conversation;
pub mod error;
pub mod orchestrate;
pub mod policy;
pub mod server;
pub mod session;
pub mod telemetry;
pub mod types;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use channel::{Channel, MessageKind, TypedMessage};
pub use error::{Result, SessionError};
pub use orchestrate::{DiscourseRoutine, Supervisor, SupervisorOutcome};
pub use server::Server;
pub use session::Session;
