//! Humility Survey: intellectual humility questionnaires.
//!
//! Two flows share one session model: a Likert-scale wizard scored against a
//! normative baseline, and a conversation that probes open answers with
//! generated follow-up questions before an LLM assessment.

pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod questions;
pub mod routes;
pub mod session;
pub mod wizard;
