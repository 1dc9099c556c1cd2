//! LLM integration.
//!
//! The survey talks to a single OpenAI-compatible Chat Completions endpoint
//! through the `LlmProvider` trait, so tests can swap in stubs.

pub mod openai;
pub mod provider;

pub use openai::OpenAiProvider;
pub use provider::*;

use std::sync::Arc;

use crate::error::LlmError;

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: secrecy::SecretString,
    pub base_url: String,
    pub model: String,
    /// Sampling temperature used for both follow-up generation and scoring.
    pub temperature: f32,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider = OpenAiProvider::new(config.clone())?;
    tracing::info!("Using OpenAI-compatible endpoint {} (model: {})", config.base_url, config.model);
    Ok(Arc::new(provider))
}
