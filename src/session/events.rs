//! User events and their dispatch onto a session.
//!
//! Each event type has its own handler; every handler returns the render
//! instruction for the presentation layer or rejects the event leaving the
//! session unchanged.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::conversation::AssistantMessage;
use crate::error::SurveyError;
use crate::wizard::WizardView;

use super::{Flow, Session};

/// An input from the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Pick a 1-5 value for a scale statement.
    SelectAnswer { index: usize, value: u8 },
    Next,
    Previous,
    /// Scale: submit every answer at once. Conversation: request the final
    /// assessment once all questions are answered.
    Submit,
    /// Free-text answer in a conversation.
    Message { content: String },
    Reset,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectAnswer { .. } => "select_answer",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::Submit => "submit",
            Self::Message { .. } => "message",
            Self::Reset => "reset",
        }
    }
}

/// What to show after an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Render {
    /// The current wizard screen.
    Wizard(WizardView),
    /// New assistant lines for the chat.
    Chat { messages: Vec<AssistantMessage> },
}

impl Session {
    /// Route an event to its handler.
    pub async fn dispatch(&mut self, event: SessionEvent) -> Result<Render, SurveyError> {
        debug!(session_id = %self.id, event = event.name(), "Dispatching session event");
        self.touch();
        match event {
            SessionEvent::SelectAnswer { index, value } => self.on_answer(index, value),
            SessionEvent::Next => self.on_next(),
            SessionEvent::Previous => self.on_previous(),
            SessionEvent::Submit => self.on_submit().await,
            SessionEvent::Message { content } => self.on_message(&content).await,
            SessionEvent::Reset => Ok(self.on_reset()),
        }
    }

    pub fn on_answer(&mut self, index: usize, value: u8) -> Result<Render, SurveyError> {
        let wizard = self.wizard_mut("select_answer")?;
        wizard.select_answer(index, value)?;
        Ok(Render::Wizard(wizard.view()))
    }

    pub fn on_next(&mut self) -> Result<Render, SurveyError> {
        let wizard = self.wizard_mut("next")?;
        wizard.advance()?;
        Ok(Render::Wizard(wizard.view()))
    }

    pub fn on_previous(&mut self) -> Result<Render, SurveyError> {
        let wizard = self.wizard_mut("previous")?;
        wizard.retreat()?;
        Ok(Render::Wizard(wizard.view()))
    }

    pub async fn on_submit(&mut self) -> Result<Render, SurveyError> {
        match &mut self.flow {
            Flow::Wizard(wizard) => {
                wizard.submit_all()?;
                Ok(Render::Wizard(wizard.view()))
            }
            Flow::Conversation {
                conversation,
                collaborators,
            } => {
                let messages = conversation.finalize(collaborators).await?;
                Ok(Render::Chat { messages })
            }
        }
    }

    pub async fn on_message(&mut self, content: &str) -> Result<Render, SurveyError> {
        let mode = self.mode();
        match &mut self.flow {
            Flow::Conversation {
                conversation,
                collaborators,
            } => {
                let messages = conversation.handle_message(content, collaborators).await?;
                Ok(Render::Chat { messages })
            }
            Flow::Wizard(_) => Err(SurveyError::UnsupportedEvent {
                event: "message".to_string(),
                mode: mode.to_string(),
            }),
        }
    }

    pub fn on_reset(&mut self) -> Render {
        info!(session_id = %self.id, mode = %self.mode(), "Session reset");
        match &mut self.flow {
            Flow::Wizard(wizard) => {
                wizard.reset();
                Render::Wizard(wizard.view())
            }
            Flow::Conversation { conversation, .. } => {
                conversation.reset();
                Render::Chat {
                    messages: vec![conversation.current_prompt()],
                }
            }
        }
    }

    fn wizard_mut(
        &mut self,
        event: &str,
    ) -> Result<&mut crate::wizard::WizardController, SurveyError> {
        let mode = self.mode();
        match &mut self.flow {
            Flow::Wizard(wizard) => Ok(wizard),
            Flow::Conversation { .. } => Err(SurveyError::UnsupportedEvent {
                event: event.to_string(),
                mode: mode.to_string(),
            }),
        }
    }
}
