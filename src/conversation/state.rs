//! Conversation state machine phases.

use serde::{Deserialize, Serialize};

/// Where the conversational questionnaire currently is.
///
/// Progresses: `Preset(0)` → `FollowUp(0, k)`… → `Preset(1)` → … → `Final` →
/// `Done`. An empty follow-up queue skips straight from `Preset(i)` to the
/// next preset question (or `Final`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ConversationPhase {
    /// Waiting for the answer to preset question `question`.
    Preset { question: usize },
    /// `asked` follow-ups of the current queue have been shown; waiting for
    /// the answer to the last one.
    FollowUp { question: usize, asked: usize },
    /// All preset questions answered; the assessment has not been produced.
    Final,
    /// Assessment rendered. Only a reset leaves this phase.
    Done,
}

impl ConversationPhase {
    /// Check if a transition from `self` to `target` is valid for a
    /// questionnaire of `question_count` preset questions.
    pub fn can_transition_to(&self, target: ConversationPhase, question_count: usize) -> bool {
        use ConversationPhase::*;
        let is_last = |i: usize| i + 1 == question_count;
        match (*self, target) {
            (Preset { question: i }, FollowUp { question: j, asked: 1 }) => i == j,
            (Preset { question: i }, Preset { question: j }) => j == i + 1 && j < question_count,
            (Preset { question: i }, Final) => is_last(i),
            (FollowUp { question: i, asked: k }, FollowUp { question: j, asked: l }) => {
                i == j && l == k + 1
            }
            (FollowUp { question: i, .. }, Preset { question: j }) => {
                j == i + 1 && j < question_count
            }
            (FollowUp { question: i, .. }, Final) => is_last(i),
            (Final, Done) => true,
            _ => false,
        }
    }

    /// Whether this phase is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Index of the preset question in progress, if any.
    pub fn question(&self) -> Option<usize> {
        match self {
            Self::Preset { question } | Self::FollowUp { question, .. } => Some(*question),
            Self::Final | Self::Done => None,
        }
    }
}

impl Default for ConversationPhase {
    fn default() -> Self {
        Self::Preset { question: 0 }
    }
}

impl std::fmt::Display for ConversationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Preset { question } => write!(f, "preset({question})"),
            Self::FollowUp { question, asked } => write!(f, "follow_up({question}, {asked})"),
            Self::Final => write!(f, "final"),
            Self::Done => write!(f, "done"),
        }
    }
}
