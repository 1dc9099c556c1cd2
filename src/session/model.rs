//! Response and mode types shared by both questionnaire flows.

use serde::{Deserialize, Serialize};

/// One completed question.
///
/// Appended to a session's response list when the question is finished and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Response {
    /// A Likert statement answered on the 1-5 scale.
    Scale { question: String, value: u8 },
    /// An open-ended preset question with the answers to its follow-ups.
    Open {
        question: String,
        preset_answer: String,
        followup_answers: Vec<String>,
    },
}

impl Response {
    pub fn scale(question: impl Into<String>, value: u8) -> Self {
        Self::Scale {
            question: question.into(),
            value,
        }
    }

    pub fn question(&self) -> &str {
        match self {
            Self::Scale { question, .. } | Self::Open { question, .. } => question,
        }
    }
}

/// Which questionnaire a deployment runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyMode {
    /// Fixed-choice Likert wizard.
    Scale,
    /// Open-ended chat with generated follow-ups.
    Conversation,
}

impl std::fmt::Display for SurveyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scale => write!(f, "scale"),
            Self::Conversation => write!(f, "conversation"),
        }
    }
}

impl std::str::FromStr for SurveyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scale" | "likert" | "wizard" => Ok(Self::Scale),
            "conversation" | "chat" => Ok(Self::Conversation),
            other => Err(format!("unknown survey mode '{other}' (expected scale or conversation)")),
        }
    }
}
