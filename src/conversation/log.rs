// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Append-only conversation log.

use serde::{Deserialize, Serialize};

use super::turn::{Turn, UtteranceType};

/// Ordered record of every turn in a discourse.
///
/// Insertion order is causal order. The only mutator is [`ConversationLog::append`];
/// everything else reads through [`ConversationLog::view`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationLog {
    turns: Vec<Turn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn and return its position.
    pub fn append(&mut self, turn: Turn) -> usize {
        self.turns.push(turn);
        self.turns.len() - 1
    }

    /// Read-only view of all turns in order.
    pub fn view(&self) -> &[Turn] {
        &self.turns
    }

    pub fn get(&self, index: usize) -> Option<&Turn> {
        self.turns.get(index)
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Whether the most recent turn asks a question.
    pub fn last_is_questioning(&self) -> bool {
        self.last().is_some_and(Turn::is_questioning)
    }

    /// Length of the trailing run of non-questioning turns.
    pub fn trailing_answer_run(&self) -> usize {
        self.turns
            .iter()
            .rev()
            .take_while(|turn| !turn.is_questioning())
            .count()
    }

    /// Count turns of a given type.
    pub fn count_of(&self, utterance_type: UtteranceType) -> usize {
        self.turns
            .iter()
            .filter(|turn| turn.utterance_type == utterance_type)
            .count()
    }

    /// Plain-text transcript, one `role: utterance` line per turn.
    pub fn transcript(&self) -> String {
        self.turns
            .iter()
            .map(|turn| format!("{}: {}", turn.role, turn.utterance))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(role: &str, kind: UtteranceType) -> Turn {
        Turn::new(role, format!("{} says something", role), kind)
    }

    #[test]
    fn test_append_preserves_order() {
        let mut log = ConversationLog::new();
        assert_eq!(log.append(turn("Guest", UtteranceType::OriginalQuestion)), 0);
        assert_eq!(log.append(turn("Expert", UtteranceType::Response)), 1);

        let roles: Vec<_> = log.view().iter().map(|t| t.role.as_str()).collect();
        assert_eq!(roles, vec!["Guest", "Expert"]);
        assert_eq!(log.get(1).unwrap().role, "Expert");
    }

    #[test]
    fn test_trailing_answer_run() {
        let mut log = ConversationLog::new();
        assert_eq!(log.trailing_answer_run(), 0);

        log.append(turn("Guest", UtteranceType::OriginalQuestion));
        assert_eq!(log.trailing_answer_run(), 0);

        log.append(turn("A", UtteranceType::Response));
        log.append(turn("B", UtteranceType::PotentialAnswer));
        assert_eq!(log.trailing_answer_run(), 2);

        log.append(turn("Moderator", UtteranceType::InformationRequest));
        assert_eq!(log.trailing_answer_run(), 0);
    }

    #[test]
    fn test_last_is_questioning() {
        let mut log = ConversationLog::new();
        assert!(!log.last_is_questioning());

        log.append(turn("Guest", UtteranceType::OriginalQuestion));
        assert!(log.last_is_questioning());

        log.append(turn("A", UtteranceType::FurtherDetails));
        assert!(!log.last_is_questioning());
    }

    #[test]
    fn test_transcript_and_counts() {
        let mut log = ConversationLog::new();
        log.append(Turn::new("Guest", "why?", UtteranceType::OriginalQuestion));
        log.append(Turn::new("Expert", "because", UtteranceType::Response));

        assert_eq!(log.transcript(), "Guest: why?\nExpert: because");
        assert_eq!(log.count_of(UtteranceType::Response), 1);
        assert_eq!(log.len(), 2);
    }
}
