// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Approval of proposed edits.
//!
//! Every proposed edit is shown to the user as a unified diff and held until
//! the user accepts it, discards it, or gives feedback and then decides.
//! Only accepted edits touch the filesystem.
//!
//! # Components
//!
//! - [`ApprovalMachine`]: the pure state machine, usable without I/O
//! - [`ApprovalWorkflow`]: drives the machine over a [`Channel`](crate::channel::Channel)
//! - [`ChannelQuestions`]: free-text questions to the user
//! - [`unified_diff`]: diff rendering
//! - [`write_file`]: atomic persistence on a blocking thread

mod diff;
mod machine;
mod persist;
mod types;
mod workflow;

pub use diff::{unified_diff, DEFAULT_CONTEXT_LINES};
pub use machine::{ApprovalError, ApprovalMachine, ApprovalState, Prompt, Step};
pub use persist::{resolve_path, write_file};
pub use types::{Choice, Decision, EditOutcome, ProposedEdit};
pub use workflow::{ApprovalWorkflow, ChannelQuestions};
