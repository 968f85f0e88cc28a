// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Shared value types.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

/// Token usage reported by a generation call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the input/prompt
    pub input_tokens: u32,
    /// Number of tokens in the output/completion
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Get total tokens (input + output).
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, other: Self) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// Payload of a `token_usage` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenUsageReport {
    pub agent: String,
    pub request_tokens: u32,
    pub response_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl TokenUsageReport {
    pub fn new(agent: impl Into<String>, usage: TokenUsage, model: Option<String>) -> Self {
        Self {
            agent: agent.into(),
            request_tokens: usage.input_tokens,
            response_tokens: usage.output_tokens,
            model,
        }
    }
}
