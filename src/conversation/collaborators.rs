//! External collaborators of the conversational flow: the follow-up
//! generator and the scorer, plus their LLM-backed implementations.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::session::model::Response;

use super::prompts::{followup_messages, scoring_messages};

/// Produces raw follow-up question text for a preset answer.
#[async_trait]
pub trait FollowUpGenerator: Send + Sync {
    /// Returns newline-separated questions. The caller parses defensively;
    /// no particular line count is guaranteed.
    async fn generate_followups(
        &self,
        preset_question: &str,
        user_answer: &str,
        transcript: &[ChatMessage],
    ) -> Result<String, LlmError>;
}

/// Turns a completed response list into free-text assessment.
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn score(&self, responses: &[Response]) -> Result<String, LlmError>;
}

/// The pair of collaborators a conversation needs.
#[derive(Clone)]
pub struct Collaborators {
    pub generator: Arc<dyn FollowUpGenerator>,
    pub scorer: Arc<dyn Scorer>,
}

impl Collaborators {
    pub fn new(generator: Arc<dyn FollowUpGenerator>, scorer: Arc<dyn Scorer>) -> Self {
        Self { generator, scorer }
    }

    /// Both collaborators backed by the same LLM provider.
    pub fn from_llm(llm: Arc<dyn LlmProvider>, temperature: f32) -> Self {
        Self {
            generator: Arc::new(LlmFollowUpGenerator::new(Arc::clone(&llm), temperature)),
            scorer: Arc::new(LlmScorer::new(llm, temperature)),
        }
    }
}

/// Follow-up generator that asks an LLM.
pub struct LlmFollowUpGenerator {
    llm: Arc<dyn LlmProvider>,
    temperature: f32,
    max_tokens: u32,
}

impl LlmFollowUpGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, temperature: f32) -> Self {
        Self {
            llm,
            temperature,
            max_tokens: 300,
        }
    }
}

#[async_trait]
impl FollowUpGenerator for LlmFollowUpGenerator {
    async fn generate_followups(
        &self,
        preset_question: &str,
        user_answer: &str,
        transcript: &[ChatMessage],
    ) -> Result<String, LlmError> {
        let request = CompletionRequest::new(followup_messages(
            preset_question,
            user_answer,
            transcript,
        ))
        .with_temperature(self.temperature)
        .with_max_tokens(self.max_tokens);

        let response = self.llm.complete(request).await?;
        debug!(
            model = self.llm.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            cost = %response.cost(self.llm.cost_per_token()),
            finish_reason = ?response.finish_reason,
            "Follow-up generation completed"
        );
        Ok(response.content)
    }
}

/// Scorer that asks an LLM for a 1-10 rating and rationale.
pub struct LlmScorer {
    llm: Arc<dyn LlmProvider>,
    temperature: f32,
    max_tokens: u32,
}

impl LlmScorer {
    pub fn new(llm: Arc<dyn LlmProvider>, temperature: f32) -> Self {
        Self {
            llm,
            temperature,
            max_tokens: 600,
        }
    }
}

#[async_trait]
impl Scorer for LlmScorer {
    async fn score(&self, responses: &[Response]) -> Result<String, LlmError> {
        let request = CompletionRequest::new(scoring_messages(responses))
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let response = self.llm.complete(request).await?;
        info!(
            model = self.llm.model_name(),
            responses = responses.len(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            cost = %response.cost(self.llm.cost_per_token()),
            "Final assessment generated"
        );
        Ok(response.content)
    }
}
