//! Per-user sessions: one questionnaire run plus its bookkeeping.

pub mod events;
pub mod input;
pub mod model;
pub mod store;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::ConversationConfig;
use crate::conversation::{Collaborators, Conversation, ConversationPhase};
use crate::error::SurveyError;
use crate::llm::ChatMessage;
use crate::questions::{PRESET_QUESTIONS, SCALE_STATEMENTS, to_owned_list};
use crate::wizard::WizardController;

pub use events::{Render, SessionEvent};
pub use input::{Command, InputParser};
pub use model::{Response, SurveyMode};
pub use store::{SessionStore, spawn_prune_task};

/// The questionnaire a session runs.
pub enum Flow {
    Wizard(WizardController),
    Conversation {
        conversation: Conversation,
        collaborators: Collaborators,
    },
}

/// One user's questionnaire run.
pub struct Session {
    pub id: Uuid,
    pub(crate) flow: Flow,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Serializable view of a session for the HTTP API.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub mode: SurveyMode,
    pub complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<ConversationPhase>,
    pub render: Render,
    pub responses: Vec<Response>,
    /// Full chat history of a conversation session, for re-rendering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Vec<ChatMessage>>,
}

impl Session {
    fn with_flow(flow: Flow) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            flow,
            created_at: now,
            updated_at: now,
        }
    }

    /// Scale session over the given statements.
    pub fn scale(statements: Vec<String>) -> Result<Self, SurveyError> {
        Ok(Self::with_flow(Flow::Wizard(WizardController::new(statements)?)))
    }

    /// Conversational session over the given preset questions.
    pub fn conversation(
        questions: Vec<String>,
        config: ConversationConfig,
        collaborators: Collaborators,
    ) -> Result<Self, SurveyError> {
        Ok(Self::with_flow(Flow::Conversation {
            conversation: Conversation::new(questions, config)?,
            collaborators,
        }))
    }

    /// Session over the built-in question set for `mode`.
    ///
    /// Conversation mode needs collaborators; asking for it without them is
    /// rejected as an unsupported mode.
    pub fn for_mode(
        mode: SurveyMode,
        config: &ConversationConfig,
        collaborators: Option<&Collaborators>,
    ) -> Result<Self, SurveyError> {
        match (mode, collaborators) {
            (SurveyMode::Scale, _) => Self::scale(to_owned_list(&SCALE_STATEMENTS)),
            (SurveyMode::Conversation, Some(collaborators)) => Self::conversation(
                to_owned_list(&PRESET_QUESTIONS),
                config.clone(),
                collaborators.clone(),
            ),
            (SurveyMode::Conversation, None) => Err(SurveyError::UnsupportedEvent {
                event: "create".to_string(),
                mode: mode.to_string(),
            }),
        }
    }

    pub fn mode(&self) -> SurveyMode {
        match self.flow {
            Flow::Wizard(_) => SurveyMode::Scale,
            Flow::Conversation { .. } => SurveyMode::Conversation,
        }
    }

    pub fn is_complete(&self) -> bool {
        match &self.flow {
            Flow::Wizard(wizard) => wizard.is_completed(),
            Flow::Conversation { conversation, .. } => conversation.is_complete(),
        }
    }

    /// Completed responses, in question order.
    pub fn responses(&self) -> &[Response] {
        match &self.flow {
            Flow::Wizard(wizard) => wizard.responses(),
            Flow::Conversation { conversation, .. } => conversation.responses(),
        }
    }

    /// Chat history; conversation sessions only.
    pub fn transcript(&self) -> Option<&[ChatMessage]> {
        match &self.flow {
            Flow::Wizard(_) => None,
            Flow::Conversation { conversation, .. } => Some(conversation.transcript()),
        }
    }

    /// What the user should currently be looking at.
    pub fn render(&self) -> Render {
        match &self.flow {
            Flow::Wizard(wizard) => Render::Wizard(wizard.view()),
            Flow::Conversation { conversation, .. } => Render::Chat {
                messages: vec![conversation.current_prompt()],
            },
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let phase = match &self.flow {
            Flow::Wizard(_) => None,
            Flow::Conversation { conversation, .. } => Some(conversation.phase()),
        };
        SessionSnapshot {
            id: self.id,
            mode: self.mode(),
            complete: self.is_complete(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            phase,
            render: self.render(),
            responses: self.responses().to_vec(),
            transcript: self.transcript().map(<[ChatMessage]>::to_vec),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Whether the session has seen no activity for longer than `timeout`.
    pub fn is_idle(&self, now: DateTime<Utc>, timeout: std::time::Duration) -> bool {
        let idle = now.signed_duration_since(self.updated_at);
        idle.to_std().is_ok_and(|idle| idle > timeout)
    }
}
