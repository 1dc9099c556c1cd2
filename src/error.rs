//! Error types for the survey service.

use std::time::Duration;

use uuid::Uuid;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Survey error: {0}")]
    Survey(#[from] SurveyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },
}

/// Errors raised by the questionnaire flows and the session layer.
///
/// Every variant except `Collaborator` is a rejected input: the session is
/// left exactly as it was before the call.
#[derive(Debug, thiserror::Error)]
pub enum SurveyError {
    #[error("Question {index} has not been answered")]
    MissingAnswer { index: usize },

    #[error("Missing answers for questions {indices:?}")]
    MissingAnswers { indices: Vec<usize> },

    #[error("Question index {index} out of range (0..{count})")]
    InvalidIndex { index: usize, count: usize },

    #[error("Answer value {value} outside the 1-5 scale")]
    InvalidValue { value: u8 },

    #[error("Already at the first question")]
    AtFirstQuestion,

    #[error("Questionnaire already completed; reset to start over")]
    AlreadyCompleted,

    #[error("A questionnaire needs at least one question")]
    NoQuestions,

    #[error("Answer must not be empty")]
    EmptyAnswer,

    #[error("{remaining} question(s) still need an answer")]
    QuestionsRemaining { remaining: usize },

    #[error("Event {event} is not accepted by a {mode} session")]
    UnsupportedEvent { event: String, mode: String },

    #[error("Session {id} not found")]
    SessionNotFound { id: Uuid },

    #[error("Collaborator call failed: {0}")]
    Collaborator(#[from] LlmError),
}

impl SurveyError {
    /// Whether this error came from an external call rather than user input.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(self, Self::Collaborator(_))
    }
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
