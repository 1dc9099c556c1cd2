//! Configuration types, read from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::llm::LlmConfig;
use crate::session::model::SurveyMode;

/// Front end the binary runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interface {
    /// JSON HTTP API.
    Http,
    /// Interactive terminal session on stdin/stdout.
    Cli,
}

impl FromStr for Interface {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" | "server" => Ok(Self::Http),
            "cli" | "repl" | "terminal" => Ok(Self::Cli),
            other => Err(format!("unknown interface '{other}' (expected http or cli)")),
        }
    }
}

/// Settings for the conversational flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationConfig {
    /// Upper bound on follow-up questions kept from one generator reply.
    pub max_followups: usize,
    /// Whether the user must type `final_token` before the scorer runs.
    pub require_final_token: bool,
    pub final_token: String,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_followups: 4,
            require_final_token: true,
            final_token: "final".to_string(),
        }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone)]
pub struct SurveyConfig {
    pub mode: SurveyMode,
    pub interface: Interface,
    pub port: u16,
    /// Sessions untouched for this long are discarded.
    pub session_idle_timeout: Duration,
    pub conversation: ConversationConfig,
    /// Present only in conversation mode.
    pub llm: Option<LlmConfig>,
    /// Directory for daily-rolling log files; stderr only when unset.
    pub log_dir: Option<PathBuf>,
}

impl SurveyConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mode: SurveyMode = parse_or(&get, "SURVEY_MODE", SurveyMode::Scale)?;
        let interface: Interface = parse_or(&get, "SURVEY_INTERFACE", Interface::Http)?;
        let port: u16 = parse_or(&get, "SURVEY_PORT", 8080)?;
        let idle_secs: u64 = parse_or(&get, "SURVEY_SESSION_IDLE_SECS", 3600)?;

        let defaults = ConversationConfig::default();
        let max_followups: usize = parse_or(&get, "SURVEY_MAX_FOLLOWUPS", defaults.max_followups)?;
        if max_followups == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SURVEY_MAX_FOLLOWUPS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        let require_final_token = match get("SURVEY_REQUIRE_FINAL_TOKEN") {
            Some(raw) => parse_bool("SURVEY_REQUIRE_FINAL_TOKEN", &raw)?,
            None => defaults.require_final_token,
        };

        let llm = match mode {
            SurveyMode::Scale => None,
            SurveyMode::Conversation => {
                let api_key = get("OPENAI_API_KEY").ok_or_else(|| ConfigError::MissingRequired {
                    key: "OPENAI_API_KEY".to_string(),
                    hint: "Conversation mode calls the model API; export OPENAI_API_KEY=sk-..."
                        .to_string(),
                })?;
                Some(LlmConfig {
                    api_key: secrecy::SecretString::from(api_key),
                    base_url: get("OPENAI_BASE_URL")
                        .unwrap_or_else(|| "https://api.openai.com".to_string()),
                    model: get("SURVEY_MODEL").unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
                    temperature: parse_or(&get, "SURVEY_TEMPERATURE", 0.9)?,
                })
            }
        };

        Ok(Self {
            mode,
            interface,
            port,
            session_idle_timeout: Duration::from_secs(idle_secs),
            conversation: ConversationConfig {
                max_followups,
                require_final_token,
                ..defaults
            },
            llm,
            log_dir: get("SURVEY_LOG_DIR").map(PathBuf::from),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}
