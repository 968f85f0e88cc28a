// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Approval state machine.
//!
//! ```text
//! AwaitingChoice --y--> Accepted
//!                --n--> Discarded
//!                --f--> AwaitingFeedback --text--> AwaitingFinalChoice --y--> AcceptedWithFeedback
//!                                                                      --n--> DiscardedWithFeedback
//! ```
//!
//! Invalid input leaves the state unchanged. Once decided, the machine
//! rejects further input.

use thiserror::Error;

use super::types::{Choice, Decision};
use crate::channel::{ChannelError, MessageKind};

#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("Edit already decided")]
    AlreadyDecided,

    #[error("Approval cancelled")]
    Cancelled,

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Diff rendering failed: {0}")]
    Render(String),
}

/// What the user is asked next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Accept, discard, or give feedback.
    Choice,
    /// Free-text feedback.
    Feedback,
    /// Accept or discard after feedback.
    FinalChoice,
}

impl Prompt {
    /// Message type the prompt is sent and answered on.
    pub fn kind(&self) -> MessageKind {
        match self {
            Prompt::Choice | Prompt::FinalChoice => MessageKind::Confirmation,
            Prompt::Feedback => MessageKind::Question,
        }
    }

    pub fn text(&self, filename: &str) -> String {
        match self {
            Prompt::Choice => format!(
                "Do you want to accept, discard, or provide feedback for the update for {}? (y/n/f)",
                filename
            ),
            Prompt::Feedback => {
                format!("Please provide your feedback for the update of {}.", filename)
            }
            Prompt::FinalChoice => {
                format!("Do you want to accept the update for {} now? (y/n)", filename)
            }
        }
    }

    /// Diagnostic shown when `input` is not a valid answer to this prompt.
    pub fn invalid_text(&self, input: &str) -> String {
        match self {
            Prompt::FinalChoice => format!("Invalid choice '{}'. Please enter 'y' or 'n'.", input),
            _ => format!("Invalid choice '{}'. Please enter 'y', 'n', or 'f'.", input),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalState {
    AwaitingChoice,
    AwaitingFeedback,
    AwaitingFinalChoice { feedback: String },
    Decided(Decision),
}

/// Result of feeding one reply to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Ask the next prompt.
    Prompt(Prompt),
    /// Input was not understood; ask the same prompt again.
    Invalid { input: String, prompt: Prompt },
    /// Terminal decision reached.
    Decided(Decision),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalMachine {
    state: ApprovalState,
}

impl Default for ApprovalMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ApprovalMachine {
    pub fn new() -> Self {
        Self {
            state: ApprovalState::AwaitingChoice,
        }
    }

    pub fn state(&self) -> &ApprovalState {
        &self.state
    }

    pub fn is_decided(&self) -> bool {
        matches!(self.state, ApprovalState::Decided(_))
    }

    pub fn decision(&self) -> Option<&Decision> {
        match &self.state {
            ApprovalState::Decided(decision) => Some(decision),
            _ => None,
        }
    }

    /// Prompt for the current state, or `None` once decided.
    pub fn prompt(&self) -> Option<Prompt> {
        match self.state {
            ApprovalState::AwaitingChoice => Some(Prompt::Choice),
            ApprovalState::AwaitingFeedback => Some(Prompt::Feedback),
            ApprovalState::AwaitingFinalChoice { .. } => Some(Prompt::FinalChoice),
            ApprovalState::Decided(_) => None,
        }
    }

    /// Feed one reply.
    pub fn apply(&mut self, input: &str) -> Result<Step, ApprovalError> {
        let (next, step) = match &self.state {
            ApprovalState::Decided(_) => return Err(ApprovalError::AlreadyDecided),

            ApprovalState::AwaitingChoice => match Choice::parse(input) {
                Some(Choice::Yes) => decided(Decision::Accepted),
                Some(Choice::No) => decided(Decision::Discarded),
                Some(Choice::Feedback) => (
                    ApprovalState::AwaitingFeedback,
                    Step::Prompt(Prompt::Feedback),
                ),
                None => return Ok(invalid(input, Prompt::Choice)),
            },

            ApprovalState::AwaitingFeedback => {
                let feedback = input.trim().to_string();
                (
                    ApprovalState::AwaitingFinalChoice { feedback },
                    Step::Prompt(Prompt::FinalChoice),
                )
            }

            ApprovalState::AwaitingFinalChoice { feedback } => match Choice::parse(input) {
                Some(Choice::Yes) => decided(Decision::AcceptedWithFeedback {
                    feedback: feedback.clone(),
                }),
                Some(Choice::No) => decided(Decision::DiscardedWithFeedback {
                    feedback: feedback.clone(),
                }),
                _ => return Ok(invalid(input, Prompt::FinalChoice)),
            },
        };

        self.state = next;
        Ok(step)
    }
}

fn decided(decision: Decision) -> (ApprovalState, Step) {
    (
        ApprovalState::Decided(decision.clone()),
        Step::Decided(decision),
    )
}

fn invalid(input: &str, prompt: Prompt) -> Step {
    Step::Invalid {
        input: input.trim().to_lowercase(),
        prompt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept() {
        let mut machine = ApprovalMachine::new();
        assert_eq!(machine.prompt(), Some(Prompt::Choice));
        assert_eq!(machine.apply(" Y ").unwrap(), Step::Decided(Decision::Accepted));
        assert!(machine.is_decided());
        assert_eq!(machine.prompt(), None);
    }

    #[test]
    fn test_discard() {
        let mut machine = ApprovalMachine::new();
        assert_eq!(machine.apply("n").unwrap(), Step::Decided(Decision::Discarded));
    }

    #[test]
    fn test_feedback_then_discard() {
        let mut machine = ApprovalMachine::new();
        assert_eq!(machine.apply("f").unwrap(), Step::Prompt(Prompt::Feedback));
        assert_eq!(
            machine.apply("  use a HashMap  ").unwrap(),
            Step::Prompt(Prompt::FinalChoice)
        );
        assert_eq!(
            machine.apply("n").unwrap(),
            Step::Decided(Decision::DiscardedWithFeedback {
                feedback: "use a HashMap".into()
            })
        );
    }

    #[test]
    fn test_feedback_then_accept() {
        let mut machine = ApprovalMachine::new();
        machine.apply("F").unwrap();
        machine.apply("looks fine").unwrap();
        let step = machine.apply("y").unwrap();
        assert_eq!(
            step,
            Step::Decided(Decision::AcceptedWithFeedback {
                feedback: "looks fine".into()
            })
        );
    }

    #[test]
    fn test_feedback_text_is_not_parsed_as_choice() {
        let mut machine = ApprovalMachine::new();
        machine.apply("f").unwrap();
        // "y" here is feedback, not acceptance
        assert_eq!(machine.apply("y").unwrap(), Step::Prompt(Prompt::FinalChoice));
        assert!(!machine.is_decided());
    }

    #[test]
    fn test_invalid_input_keeps_state() {
        let mut machine = ApprovalMachine::new();
        let step = machine.apply("Maybe").unwrap();
        assert_eq!(
            step,
            Step::Invalid {
                input: "maybe".into(),
                prompt: Prompt::Choice
            }
        );
        assert_eq!(machine.state(), &ApprovalState::AwaitingChoice);

        machine.apply("f").unwrap();
        machine.apply("fb").unwrap();
        // 'f' is not valid at the final prompt
        let step = machine.apply("f").unwrap();
        assert!(matches!(step, Step::Invalid { prompt: Prompt::FinalChoice, .. }));
        assert!(matches!(
            machine.state(),
            ApprovalState::AwaitingFinalChoice { .. }
        ));
    }

    #[test]
    fn test_decided_is_write_once() {
        let mut machine = ApprovalMachine::new();
        machine.apply("y").unwrap();
        assert!(matches!(machine.apply("n"), Err(ApprovalError::AlreadyDecided)));
        assert_eq!(machine.decision(), Some(&Decision::Accepted));
    }

    #[test]
    fn test_prompt_texts() {
        assert_eq!(
            Prompt::Choice.text("a.rs"),
            "Do you want to accept, discard, or provide feedback for the update for a.rs? (y/n/f)"
        );
        assert_eq!(Prompt::Feedback.kind(), MessageKind::Question);
        assert_eq!(Prompt::FinalChoice.kind(), MessageKind::Confirmation);
        assert_eq!(
            Prompt::Choice.invalid_text("x"),
            "Invalid choice 'x'. Please enter 'y', 'n', or 'f'."
        );
    }
}
