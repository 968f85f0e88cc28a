// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Orchestration of one client session.
//!
//! # Architecture
//!
//! - **Supervisor**: races the routine against a client `stop` message and
//!   reports exactly one terminal message (`completed`, `error`, or the
//!   cancellation log).
//!
//! - **DiscourseRoutine**: summarizes the repository, holds the multi-agent
//!   discourse, requests edits and runs them through approval.
//!
//! - **Discourse**: the turn-by-turn driver that owns the conversation log
//!   and the turn policy.
//!
//! ```text
//! Supervisor
//! ├── routine task ──► DiscourseRoutine ──► Discourse ──► collaborators
//! │                                    └──► ApprovalWorkflow ──► Channel
//! └── stop listener ──► Channel::receive("stop")
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use codepilot::orchestrate::{DiscourseRoutine, Supervisor};
//!
//! let routine = DiscourseRoutine::new(channel.clone(), collaborators, runner, session, request);
//! let outcome = Supervisor::new(channel).run(|cancel| routine.run(cancel)).await?;
//! ```

mod discourse;
mod routine;
mod supervisor;

pub use discourse::{Discourse, TurnRecord, FINAL_ANSWER_MARKER, SYSTEM_ROLE};
pub use routine::{DiscourseReport, DiscourseRoutine};
pub use supervisor::{Supervisor, SupervisorOutcome, CANCELLED_MESSAGE};
