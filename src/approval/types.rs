// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Approval value types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A change to one file, awaiting the user's decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedEdit {
    pub filename: String,
    #[serde(default)]
    pub original_content: String,
    pub updated_content: String,
}

impl ProposedEdit {
    pub fn new(
        filename: impl Into<String>,
        original_content: impl Into<String>,
        updated_content: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            original_content: original_content.into(),
            updated_content: updated_content.into(),
        }
    }
}

/// Final verdict on a proposed edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Accepted,
    AcceptedWithFeedback { feedback: String },
    Discarded,
    DiscardedWithFeedback { feedback: String },
}

impl Decision {
    pub fn is_accepted(&self) -> bool {
        matches!(
            self,
            Decision::Accepted | Decision::AcceptedWithFeedback { .. }
        )
    }

    pub fn feedback(&self) -> Option<&str> {
        match self {
            Decision::AcceptedWithFeedback { feedback }
            | Decision::DiscardedWithFeedback { feedback } => Some(feedback),
            _ => None,
        }
    }
}

/// A user choice at a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Yes,
    No,
    Feedback,
}

impl Choice {
    /// Parse a reply; whitespace and case are ignored.
    pub fn parse(reply: &str) -> Option<Self> {
        match reply.trim().to_lowercase().as_str() {
            "y" => Some(Choice::Yes),
            "n" => Some(Choice::No),
            "f" => Some(Choice::Feedback),
            _ => None,
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Choice::Yes => "y",
            Choice::No => "n",
            Choice::Feedback => "f",
        };
        f.write_str(s)
    }
}

/// Result of reviewing one edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub filename: String,
    pub decision: Decision,
    /// Set when the edit was accepted but could not be written.
    pub write_error: Option<String>,
}

impl EditOutcome {
    /// Whether the edit ended up on disk.
    pub fn applied(&self) -> bool {
        self.decision.is_accepted() && self.write_error.is_none()
    }

    /// One-line summary reported to the user.
    pub fn summary(&self) -> String {
        let f = &self.filename;
        if let Some(err) = &self.write_error {
            return format!("Failed to update {}: {}", f, err);
        }
        match &self.decision {
            Decision::Accepted => format!("Updated {}.", f),
            Decision::AcceptedWithFeedback { feedback } => {
                format!("Updated {}. Feedback provided: {}", f, feedback)
            }
            Decision::Discarded => format!("Discarded update for {}.", f),
            Decision::DiscardedWithFeedback { feedback } => {
                format!("Discarded update for {} after feedback. Feedback: {}", f, feedback)
            }
        }
    }
}
