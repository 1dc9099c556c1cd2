//! Conversational follow-up state machine.
//!
//! Walks the preset questions one at a time. Each preset answer is sent to
//! the follow-up generator; the returned lines become a queue that is asked
//! one question per turn before the next preset question. After the last
//! question the scorer runs once and its text is rendered verbatim.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ConversationConfig;
use crate::error::SurveyError;
use crate::llm::ChatMessage;
use crate::session::model::Response;

use super::collaborators::Collaborators;
use super::prompts::{FINAL_HEADING, NO_FOLLOWUPS_NOTICE, parse_followups};
use super::state::ConversationPhase;

/// What kind of assistant line is being surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// A preset question.
    Question,
    /// A generated follow-up question.
    FollowUp,
    /// Informational text that expects no answer.
    Notice,
    /// The rendered final assessment.
    Assessment,
}

/// A line the presentation layer should show as coming from the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssistantMessage {
    pub kind: MessageKind,
    pub content: String,
}

impl AssistantMessage {
    fn new(kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }
}

/// Preset question in progress: its answer and the follow-up queue.
#[derive(Debug, Clone)]
struct Turn {
    preset_answer: String,
    queue: Vec<String>,
    followup_answers: Vec<String>,
}

/// State of one conversational questionnaire run.
#[derive(Debug, Clone)]
pub struct Conversation {
    questions: Vec<String>,
    config: ConversationConfig,
    phase: ConversationPhase,
    transcript: Vec<ChatMessage>,
    responses: Vec<Response>,
    turn: Option<Turn>,
    /// Set once the scorer has answered; never cleared except by reset.
    final_result: Option<String>,
}

impl Conversation {
    pub fn new(questions: Vec<String>, config: ConversationConfig) -> Result<Self, SurveyError> {
        if questions.is_empty() {
            return Err(SurveyError::NoQuestions);
        }
        let mut conversation = Self {
            questions,
            config,
            phase: ConversationPhase::default(),
            transcript: Vec::new(),
            responses: Vec::new(),
            turn: None,
            final_result: None,
        };
        conversation.start();
        Ok(conversation)
    }

    fn start(&mut self) {
        self.transcript
            .push(ChatMessage::assistant(self.questions[0].clone()));
    }

    pub fn phase(&self) -> ConversationPhase {
        self.phase
    }

    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    /// Every assistant prompt and user answer so far, in order.
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Rendered assessment, once produced.
    pub fn final_assessment(&self) -> Option<&str> {
        self.final_result.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.phase.is_terminal()
    }

    /// The prompt currently awaiting the user, for (re)rendering.
    pub fn current_prompt(&self) -> AssistantMessage {
        match self.phase {
            ConversationPhase::Preset { question } => {
                AssistantMessage::new(MessageKind::Question, self.questions[question].clone())
            }
            ConversationPhase::FollowUp { asked, .. } => {
                let text = self
                    .turn
                    .as_ref()
                    .and_then(|t| t.queue.get(asked.saturating_sub(1)))
                    .cloned()
                    .unwrap_or_default();
                AssistantMessage::new(MessageKind::FollowUp, text)
            }
            ConversationPhase::Final => AssistantMessage::new(MessageKind::Notice, self.final_prompt()),
            ConversationPhase::Done => AssistantMessage::new(
                MessageKind::Assessment,
                self.final_result.clone().unwrap_or_default(),
            ),
        }
    }

    /// Feed one user message through the state machine.
    ///
    /// On a collaborator failure the conversation is left exactly as it was
    /// before the call, so the same message can be sent again.
    pub async fn handle_message(
        &mut self,
        input: &str,
        collaborators: &Collaborators,
    ) -> Result<Vec<AssistantMessage>, SurveyError> {
        let input = input.trim();
        match self.phase {
            ConversationPhase::Preset { question } => {
                require_text(input)?;
                self.answer_preset(question, input, collaborators).await
            }
            ConversationPhase::FollowUp { question, asked } => {
                require_text(input)?;
                self.answer_followup(question, asked, input, collaborators)
                    .await
            }
            ConversationPhase::Final => {
                if !self.config.require_final_token
                    || input.eq_ignore_ascii_case(&self.config.final_token)
                {
                    self.score_responses(Some(input), collaborators).await
                } else {
                    self.record_user(input);
                    Ok(vec![self.notice(format!(
                        "Please type **{}** to receive your final assessment.",
                        self.config.final_token
                    ))])
                }
            }
            ConversationPhase::Done => {
                self.record_user(input);
                Ok(vec![self.notice(
                    "Your assessment is complete. Reset to start a new session.",
                )])
            }
        }
    }

    /// Run the scorer and move to `Done`.
    ///
    /// Calling this again after success returns the stored assessment without
    /// another scorer call.
    pub async fn finalize(
        &mut self,
        collaborators: &Collaborators,
    ) -> Result<Vec<AssistantMessage>, SurveyError> {
        self.score_responses(None, collaborators).await
    }

    /// Scorer call behind `finalize`. `input` is the user message that
    /// triggered it; it joins the transcript only once scoring succeeds.
    async fn score_responses(
        &mut self,
        input: Option<&str>,
        collaborators: &Collaborators,
    ) -> Result<Vec<AssistantMessage>, SurveyError> {
        if let Some(ref rendered) = self.final_result {
            debug!("Final assessment already generated, returning cached result");
            return Ok(vec![AssistantMessage::new(
                MessageKind::Assessment,
                rendered.clone(),
            )]);
        }
        if self.phase != ConversationPhase::Final {
            return Err(SurveyError::QuestionsRemaining {
                remaining: self.questions.len() - self.responses.len(),
            });
        }

        let assessment = collaborators.scorer.score(&self.responses).await?;
        let rendered = format!("{FINAL_HEADING}\n{assessment}");

        self.transition(ConversationPhase::Done);
        if let Some(input) = input {
            self.record_user(input);
        }
        self.transcript.push(ChatMessage::assistant(rendered.clone()));
        self.final_result = Some(rendered.clone());
        info!(responses = self.responses.len(), "Conversation completed");

        Ok(vec![AssistantMessage::new(MessageKind::Assessment, rendered)])
    }

    /// Discard all progress and return to the first question.
    pub fn reset(&mut self) {
        self.phase = ConversationPhase::default();
        self.transcript.clear();
        self.responses.clear();
        self.turn = None;
        self.final_result = None;
        self.start();
    }

    async fn answer_preset(
        &mut self,
        question: usize,
        answer: &str,
        collaborators: &Collaborators,
    ) -> Result<Vec<AssistantMessage>, SurveyError> {
        let raw = collaborators
            .generator
            .generate_followups(&self.questions[question], answer, &self.transcript)
            .await?;
        let queue = parse_followups(&raw, self.config.max_followups);
        info!(question, followups = queue.len(), "Follow-up questions generated");

        self.transcript.push(ChatMessage::user(answer));

        let turn = Turn {
            preset_answer: answer.to_string(),
            queue,
            followup_answers: Vec::new(),
        };

        if let Some(first) = turn.queue.first().cloned() {
            self.transcript.push(ChatMessage::assistant(first.clone()));
            self.turn = Some(turn);
            self.transition(ConversationPhase::FollowUp { question, asked: 1 });
            return Ok(vec![AssistantMessage::new(MessageKind::FollowUp, first)]);
        }

        let mut out = vec![self.notice(NO_FOLLOWUPS_NOTICE)];
        out.extend(self.finish_question(question, turn, collaborators).await);
        Ok(out)
    }

    async fn answer_followup(
        &mut self,
        question: usize,
        asked: usize,
        answer: &str,
        collaborators: &Collaborators,
    ) -> Result<Vec<AssistantMessage>, SurveyError> {
        let Some(mut turn) = self.turn.take() else {
            // FollowUp is only entered with a turn in place.
            warn!(question, "Follow-up phase without an active turn");
            return Err(SurveyError::QuestionsRemaining {
                remaining: self.questions.len() - self.responses.len(),
            });
        };

        self.transcript.push(ChatMessage::user(answer));
        turn.followup_answers.push(answer.to_string());

        if let Some(next) = turn.queue.get(asked).cloned() {
            self.transcript.push(ChatMessage::assistant(next.clone()));
            self.turn = Some(turn);
            self.transition(ConversationPhase::FollowUp {
                question,
                asked: asked + 1,
            });
            return Ok(vec![AssistantMessage::new(MessageKind::FollowUp, next)]);
        }

        Ok(self.finish_question(question, turn, collaborators).await)
    }

    /// Record the response for `question` and move to the next preset
    /// question, or to `Final`.
    async fn finish_question(
        &mut self,
        question: usize,
        turn: Turn,
        collaborators: &Collaborators,
    ) -> Vec<AssistantMessage> {
        self.responses.push(Response::Open {
            question: self.questions[question].clone(),
            preset_answer: turn.preset_answer,
            followup_answers: turn.followup_answers,
        });
        self.turn = None;

        let next = question + 1;
        if next < self.questions.len() {
            let text = self.questions[next].clone();
            self.transcript.push(ChatMessage::assistant(text.clone()));
            self.transition(ConversationPhase::Preset { question: next });
            return vec![AssistantMessage::new(MessageKind::Question, text)];
        }

        self.transition(ConversationPhase::Final);
        if self.config.require_final_token {
            let prompt = self.final_prompt();
            return vec![self.notice(prompt)];
        }

        // The answer is already recorded; a scoring failure only delays the
        // assessment until the next message.
        match self.finalize(collaborators).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(error = %e, "Final assessment failed");
                vec![self.notice(
                    "Your answers are saved, but the assessment could not be generated. \
                     Send any message to try again.",
                )]
            }
        }
    }

    fn record_user(&mut self, input: &str) {
        if !input.is_empty() {
            self.transcript.push(ChatMessage::user(input));
        }
    }

    /// Build a notice and record it in the transcript.
    fn notice(&mut self, content: impl Into<String>) -> AssistantMessage {
        let content = content.into();
        self.transcript.push(ChatMessage::assistant(content.clone()));
        AssistantMessage::new(MessageKind::Notice, content)
    }

    fn final_prompt(&self) -> String {
        if self.config.require_final_token {
            format!(
                "All preset questions have been answered! Type **{}** to receive your final assessment.",
                self.config.final_token
            )
        } else {
            "All preset questions have been answered! Send any message to receive your final assessment."
                .to_string()
        }
    }

    fn transition(&mut self, target: ConversationPhase) {
        debug_assert!(
            self.phase.can_transition_to(target, self.questions.len()),
            "invalid transition {} -> {}",
            self.phase,
            target
        );
        debug!(from = %self.phase, to = %target, "Conversation phase transition");
        self.phase = target;
    }
}

fn require_text(input: &str) -> Result<(), SurveyError> {
    if input.is_empty() {
        return Err(SurveyError::EmptyAnswer);
    }
    Ok(())
}
