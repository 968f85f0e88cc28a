// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Conversation turn types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of contribution a turn makes to the discourse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UtteranceType {
    #[serde(rename = "Original Question")]
    OriginalQuestion,
    #[serde(rename = "Information Request")]
    InformationRequest,
    #[serde(rename = "Potential Answer")]
    PotentialAnswer,
    #[serde(rename = "Further Details")]
    FurtherDetails,
    #[serde(rename = "Response")]
    Response,
    #[serde(rename = "Background Information")]
    BackgroundInformation,
}

impl UtteranceType {
    /// Whether a turn of this type asks for something rather than answers.
    pub fn is_questioning(&self) -> bool {
        matches!(
            self,
            UtteranceType::OriginalQuestion | UtteranceType::InformationRequest
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UtteranceType::OriginalQuestion => "Original Question",
            UtteranceType::InformationRequest => "Information Request",
            UtteranceType::PotentialAnswer => "Potential Answer",
            UtteranceType::FurtherDetails => "Further Details",
            UtteranceType::Response => "Response",
            UtteranceType::BackgroundInformation => "Background Information",
        }
    }
}

impl fmt::Display for UtteranceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable contribution to the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Role name of the agent that produced the turn.
    pub role: String,
    /// Text of the utterance.
    pub utterance: String,
    /// What the utterance does in the discourse.
    pub utterance_type: UtteranceType,
    /// When the turn was recorded.
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(
        role: impl Into<String>,
        utterance: impl Into<String>,
        utterance_type: UtteranceType,
    ) -> Self {
        Self {
            role: role.into(),
            utterance: utterance.into(),
            utterance_type,
            timestamp: Utc::now(),
        }
    }

    pub fn is_questioning(&self) -> bool {
        self.utterance_type.is_questioning()
    }

    /// First `max_chars` characters of the utterance, for log lines.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.utterance.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{}...", head)
        } else {
            head
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_questioning_types() {
        assert!(UtteranceType::OriginalQuestion.is_questioning());
        assert!(UtteranceType::InformationRequest.is_questioning());
        assert!(!UtteranceType::PotentialAnswer.is_questioning());
        assert!(!UtteranceType::FurtherDetails.is_questioning());
        assert!(!UtteranceType::Response.is_questioning());
        assert!(!UtteranceType::BackgroundInformation.is_questioning());
    }

    #[test]
    fn test_utterance_type_wire_names() {
        let json = serde_json::to_string(&UtteranceType::InformationRequest).unwrap();
        assert_eq!(json, "\"Information Request\"");

        let parsed: UtteranceType = serde_json::from_str("\"Original Question\"").unwrap();
        assert_eq!(parsed, UtteranceType::OriginalQuestion);
        assert_eq!(parsed.to_string(), "Original Question");
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let turn = Turn::new("Guest", "héllo wörld", UtteranceType::OriginalQuestion);
        assert_eq!(turn.preview(5), "héllo...");
        assert_eq!(turn.preview(50), "héllo wörld");
    }
}
