//! Conversational questionnaire: preset questions, generated follow-ups and
//! a single scored assessment at the end.

pub mod collaborators;
pub mod machine;
pub mod prompts;
pub mod state;

pub use collaborators::{Collaborators, FollowUpGenerator, LlmFollowUpGenerator, LlmScorer, Scorer};
pub use machine::{AssistantMessage, Conversation, MessageKind};
pub use state::ConversationPhase;
