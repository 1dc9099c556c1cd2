//! Terminal front end: stdin/stdout REPL over a single session.

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::conversation::MessageKind;
use crate::error::SurveyError;
use crate::questions::scale_label;
use crate::session::{Command, InputParser, Render, Session, SessionEvent, SurveyMode};
use crate::wizard::WizardView;

const SCALE_HELP: &str = "\
Answer each statement with a number from 1 to 5.
  /back   return to the previous statement
  /reset  start over
  /quit   exit";

const CONVERSATION_HELP: &str = "\
Type your answer and press Enter.
  /reset  start over
  /quit   exit";

/// Drives one session from terminal input.
pub struct Cli {
    session: Session,
}

impl Cli {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Text shown before the first input.
    pub fn opening(&self) -> String {
        let help = match self.session.mode() {
            SurveyMode::Scale => SCALE_HELP,
            SurveyMode::Conversation => CONVERSATION_HELP,
        };
        format!("{help}\n\n{}", format_render(&self.session.render()))
    }

    /// Process one line of input. Returns `None` when the user quits.
    pub async fn handle_line(&mut self, line: &str) -> Option<String> {
        let mode = self.session.mode();
        let event = match (InputParser::parse(line), mode) {
            (Command::Quit, _) => return None,
            (Command::Help, SurveyMode::Scale) => return Some(SCALE_HELP.to_string()),
            (Command::Help, SurveyMode::Conversation) => {
                return Some(CONVERSATION_HELP.to_string());
            }
            (Command::Reset, _) => SessionEvent::Reset,
            (Command::Back, SurveyMode::Scale) => SessionEvent::Previous,
            (Command::Back, SurveyMode::Conversation) => {
                return Some("Going back is not available in a conversation.".to_string());
            }
            (Command::Choice(value), SurveyMode::Scale) => {
                return Some(self.answer_and_advance(value).await);
            }
            (Command::Text(_), SurveyMode::Scale) => {
                return Some("Please enter a number from 1 to 5.".to_string());
            }
            // Free text goes through as typed, numbers included.
            (Command::Choice(_) | Command::Text(_), SurveyMode::Conversation) => {
                SessionEvent::Message {
                    content: line.trim().to_string(),
                }
            }
        };

        Some(match self.session.dispatch(event).await {
            Ok(render) => format_render(&render),
            Err(e) => format_error(&e),
        })
    }

    async fn answer_and_advance(&mut self, value: u8) -> String {
        let index = match self.session.render() {
            Render::Wizard(WizardView::Question { index, .. }) => index,
            _ => return format_error(&SurveyError::AlreadyCompleted),
        };
        if let Err(e) = self
            .session
            .dispatch(SessionEvent::SelectAnswer { index, value })
            .await
        {
            return format_error(&e);
        }
        match self.session.dispatch(SessionEvent::Next).await {
            Ok(render) => format_render(&render),
            Err(e) => format_error(&e),
        }
    }

    /// Read stdin line by line until EOF or `/quit`.
    pub async fn run(mut self) -> crate::error::Result<()> {
        println!("\n{}\n", self.opening());
        eprint!("> ");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                eprint!("> ");
                continue;
            }
            match self.handle_line(&line).await {
                Some(output) => {
                    println!("\n{output}\n");
                    eprint!("> ");
                }
                None => break,
            }
        }
        Ok(())
    }
}

/// Plain-text rendering of a render instruction.
pub fn format_render(render: &Render) -> String {
    match render {
        Render::Wizard(WizardView::Question {
            index,
            total,
            statement,
            selected,
            ..
        }) => {
            let mut out = format!("Statement {} of {}: {}\n", index + 1, total, statement);
            for value in 1..=5u8 {
                let Some(label) = scale_label(value) else {
                    continue;
                };
                let marker = if *selected == Some(value) { "*" } else { " " };
                out.push_str(&format!("  {marker}{value}. {label}\n"));
            }
            out.trim_end().to_string()
        }
        Render::Wizard(WizardView::Results {
            summary,
            comparison,
        }) => format!(
            "Your score: {} / {}\n{}\nType /reset to take it again.",
            summary.total, summary.max, comparison
        ),
        Render::Chat { messages } => messages
            .iter()
            .map(|m| match m.kind {
                MessageKind::Notice => format!("ℹ️  {}", m.content),
                _ => m.content.clone(),
            })
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

fn format_error(err: &SurveyError) -> String {
    if err.is_collaborator_failure() {
        warn!(error = %err, "Collaborator call failed");
        return "⚠️  The assistant could not be reached. Please send your answer again.".to_string();
    }
    format!("⚠️  {err}")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::config::ConversationConfig;
    use crate::conversation::{Collaborators, FollowUpGenerator, Scorer};
    use crate::error::LlmError;
    use crate::llm::ChatMessage;
    use crate::session::Response;

    struct NoFollowUps;

    #[async_trait]
    impl FollowUpGenerator for NoFollowUps {
        async fn generate_followups(
            &self,
            _q: &str,
            _a: &str,
            _t: &[ChatMessage],
        ) -> Result<String, LlmError> {
            Ok(String::new())
        }
    }

    struct Unreachable;

    #[async_trait]
    impl Scorer for Unreachable {
        async fn score(&self, _responses: &[Response]) -> Result<String, LlmError> {
            Err(LlmError::RequestFailed {
                provider: "test".to_string(),
                reason: "offline".to_string(),
            })
        }
    }

    fn scale_cli() -> Cli {
        Cli::new(Session::scale(vec!["First?".to_string(), "Second?".to_string()]).unwrap())
    }

    #[tokio::test]
    async fn scale_answers_advance() {
        let mut cli = scale_cli();
        assert!(cli.opening().contains("Statement 1 of 2: First?"));

        let out = cli.handle_line("4").await.unwrap();
        assert!(out.contains("Statement 2 of 2: Second?"));

        let out = cli.handle_line("/back").await.unwrap();
        assert!(out.contains("*4. Agree"));

        cli.handle_line("4").await.unwrap();
        let out = cli.handle_line("5").await.unwrap();
        assert!(out.contains("Your score: 9 / 10"));
        assert!(cli.session().is_complete());

        let out = cli.handle_line("3").await.unwrap();
        assert!(out.contains("already completed"));
    }

    #[tokio::test]
    async fn scale_rejects_bad_input() {
        let mut cli = scale_cli();
        assert!(cli.handle_line("maybe").await.unwrap().contains("1 to 5"));
        assert!(cli.handle_line("9").await.unwrap().contains("outside the 1-5 scale"));
        assert!(cli.handle_line("/back").await.unwrap().contains("first question"));
        assert!(cli.handle_line("/quit").await.is_none());
    }

    #[tokio::test]
    async fn conversation_keeps_numeric_answers_verbatim() {
        let session = Session::conversation(
            vec!["How many times?".to_string()],
            ConversationConfig::default(),
            Collaborators::new(Arc::new(NoFollowUps), Arc::new(Unreachable)),
        )
        .unwrap();
        let mut cli = Cli::new(session);

        cli.handle_line(" 04 ").await.unwrap();
        match cli.session().responses() {
            [Response::Open { preset_answer, .. }] => assert_eq!(preset_answer, "04"),
            other => panic!("unexpected responses {other:?}"),
        }
    }

    #[tokio::test]
    async fn conversation_reports_collaborator_failure() {
        let session = Session::conversation(
            vec!["Only question?".to_string()],
            ConversationConfig::default(),
            Collaborators::new(Arc::new(NoFollowUps), Arc::new(Unreachable)),
        )
        .unwrap();
        let mut cli = Cli::new(session);

        let out = cli.handle_line("My answer").await.unwrap();
        assert!(out.contains(crate::conversation::prompts::NO_FOLLOWUPS_NOTICE));
        assert!(out.contains("**final**"));

        let out = cli.handle_line("final").await.unwrap();
        assert!(out.contains("Please send your answer again"));
        assert!(!cli.session().is_complete());

        let out = cli.handle_line("/back").await.unwrap();
        assert!(out.contains("not available"));
    }
}
