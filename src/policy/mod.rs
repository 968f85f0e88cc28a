// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Turn policy: who speaks next in a discourse.

mod engine;
mod types;

pub use engine::{PolicyError, TurnPolicyEngine};
pub use types::{ModeratorOverride, PolicyConfig, SelectRequest, TurnDecision};
