//! Prompts for the follow-up generator and scorer, and parsing of the
//! generator's output.

use std::sync::LazyLock;

use regex::Regex;

use crate::llm::{ChatMessage, Role};
use crate::session::model::Response;

/// Heading placed above the scorer's text.
pub const FINAL_HEADING: &str = "## Final Assessment";

/// Shown when the generator produced no usable follow-up lines.
pub const NO_FOLLOWUPS_NOTICE: &str = "No follow-up questions received.";

const FOLLOWUP_SYSTEM: &str = "You are a curious and thoughtful interviewer.";

const SCORER_SYSTEM: &str = "You are an expert psychologist.";

/// Working definition handed to the scorer.
pub const HUMILITY_DEFINITION: &str = "\
Intellectual humility is the recognition that our knowledge and understanding are always \
limited and subject to growth or change. It involves acknowledging that we can be wrong, \
while staying open to learning from new information or perspectives. Intellectually humble \
people are curious, actively seek out opposing viewpoints to refine their own thinking, \
reflect on their cognitive biases, and are willing to correct mistakes in pursuit of truth. \
It values understanding over ego and the shared search for accuracy over the need to be right.";

/// Leading list markers the model adds despite being told not to.
static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{1,2}[.)]|[-*•])\s+").expect("list marker pattern is valid")
});

/// Build the message list for a follow-up generation call.
pub fn followup_messages(
    preset_question: &str,
    user_answer: &str,
    transcript: &[ChatMessage],
) -> Vec<ChatMessage> {
    let history = render_transcript(transcript);
    let history_section = if history.is_empty() {
        String::new()
    } else {
        format!("Conversation so far:\n{history}\n\n")
    };

    let prompt = format!(
        "{history_section}\
         The user was asked: \"{preset_question}\"\n\
         And responded: \"{user_answer}\"\n\n\
         You are an expert psychologist assessing this answer for signs of intellectual humility. \
         Write 2 or 3 short follow-up questions that probe the answer further, each on its own line. \
         Then, on a separate final line, write one question asking how strongly the user agrees, \
         on a scale from 1 to 5, with a statement related to their answer. \
         Do not number the questions, do not use bullet points or any formatting, and return only \
         the plain question text."
    );

    vec![ChatMessage::system(FOLLOWUP_SYSTEM), ChatMessage::user(prompt)]
}

/// Build the message list for the final scoring call.
pub fn scoring_messages(responses: &[Response]) -> Vec<ChatMessage> {
    let mut prompt = format!(
        "Your task is to interpret how the user's answers reflect their intellectual humility, \
         using this definition:\n\n{HUMILITY_DEFINITION}\n\n\
         Evaluate the user's responses to the questions and follow-ups below. Give a final score \
         on a scale from 1 (low intellectual humility) to 10 (high intellectual humility), \
         followed by a short explanation of the score.\n\n\
         User responses:\n\n"
    );
    prompt.push_str(&render_responses(responses));

    vec![ChatMessage::system(SCORER_SYSTEM), ChatMessage::user(prompt)]
}

/// Render the response list as numbered plain text.
pub fn render_responses(responses: &[Response]) -> String {
    let mut out = String::new();
    for (n, response) in responses.iter().enumerate() {
        out.push_str(&format!("Question {}: {}\n", n + 1, response.question()));
        match response {
            Response::Scale { value, .. } => {
                out.push_str(&format!("Agreement (1-5): {value}\n"));
            }
            Response::Open {
                preset_answer,
                followup_answers,
                ..
            } => {
                out.push_str(&format!("Answer: {preset_answer}\n"));
                for (i, answer) in followup_answers.iter().enumerate() {
                    out.push_str(&format!("Follow-up {} answer: {answer}\n", i + 1));
                }
            }
        }
        out.push('\n');
    }
    out
}

fn render_transcript(transcript: &[ChatMessage]) -> String {
    transcript
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| {
            let speaker = match m.role {
                Role::User => "User",
                _ => "Interviewer",
            };
            format!("{speaker}: {}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split generator output into follow-up questions.
///
/// One question per non-empty line, trimmed, with any leading list marker
/// removed. At most `max` questions are kept.
pub fn parse_followups(raw: &str, max: usize) -> Vec<String> {
    let lines: Vec<String> = raw
        .lines()
        .map(|line| LIST_MARKER.replace(line.trim(), "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() > max {
        tracing::warn!(
            received = lines.len(),
            kept = max,
            "Generator returned more follow-ups than allowed, truncating"
        );
        return lines.into_iter().take(max).collect();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_two_lines() {
        let raw = "Why did that change your mind?\nWho helped you see it?\n";
        let queue = parse_followups(raw, 4);
        assert_eq!(
            queue,
            vec!["Why did that change your mind?", "Who helped you see it?"]
        );
    }

    #[test]
    fn parse_empty_and_whitespace() {
        assert!(parse_followups("", 4).is_empty());
        assert!(parse_followups("  \n\t\n   ", 4).is_empty());
    }

    #[test]
    fn parse_strips_list_markers() {
        let raw = "1. First?\n2) Second?\n- Third?\n• Fourth?";
        assert_eq!(
            parse_followups(raw, 10),
            vec!["First?", "Second?", "Third?", "Fourth?"]
        );
    }

    #[test]
    fn parse_keeps_leading_numbers_that_are_not_markers() {
        assert_eq!(
            parse_followups("2020 was a hard year, what changed?", 4),
            vec!["2020 was a hard year, what changed?"]
        );
    }

    #[test]
    fn parse_drops_lines_that_are_only_markers() {
        assert_eq!(parse_followups("1. \n- \nReal question?", 4), vec!["Real question?"]);
    }

    #[test]
    fn parse_clamps_to_max() {
        let raw = "a?\nb?\nc?\nd?\ne?\nf?";
        assert_eq!(parse_followups(raw, 4), vec!["a?", "b?", "c?", "d?"]);
    }

    #[test]
    fn followup_prompt_includes_question_answer_and_history() {
        let transcript = vec![
            ChatMessage::assistant("Earlier question?"),
            ChatMessage::user("Earlier answer"),
        ];
        let messages = followup_messages("Preset?", "My answer", &transcript);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        let prompt = &messages[1].content;
        assert!(prompt.contains("The user was asked: \"Preset?\""));
        assert!(prompt.contains("And responded: \"My answer\""));
        assert!(prompt.contains("Interviewer: Earlier question?"));
        assert!(prompt.contains("User: Earlier answer"));
        assert!(prompt.contains("1 to 5"));
    }

    #[test]
    fn followup_prompt_without_history() {
        let messages = followup_messages("Q?", "A", &[]);
        assert!(!messages[1].content.contains("Conversation so far"));
    }

    #[test]
    fn scoring_prompt_renders_each_response() {
        let responses = vec![
            Response::Open {
                question: "Time you were wrong?".to_string(),
                preset_answer: "About coffee".to_string(),
                followup_answers: vec!["A friend".to_string(), "4".to_string()],
            },
            Response::Open {
                question: "Sources?".to_string(),
                preset_answer: "Peer review".to_string(),
                followup_answers: vec![],
            },
        ];
        let messages = scoring_messages(&responses);
        let prompt = &messages[1].content;
        assert!(prompt.contains(HUMILITY_DEFINITION));
        assert!(prompt.contains("Question 1: Time you were wrong?"));
        assert!(prompt.contains("Answer: About coffee"));
        assert!(prompt.contains("Follow-up 2 answer: 4"));
        assert!(prompt.contains("Question 2: Sources?"));
        assert!(prompt.contains("1 (low intellectual humility) to 10"));
    }

    #[test]
    fn render_scale_response() {
        let text = render_responses(&[Response::scale("I accept I may be wrong.", 4)]);
        assert!(text.contains("Agreement (1-5): 4"));
    }
}
