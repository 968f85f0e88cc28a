// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Conversation state shared by the turn policy and the discourse routine.

mod log;
mod turn;

pub use log::ConversationLog;
pub use turn::{Turn, UtteranceType};
