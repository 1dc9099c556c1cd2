//! Static question sets.

/// Likert statements of the six-item general intellectual humility scale.
///
/// Each is answered on a 1 (strongly disagree) to 5 (strongly agree) scale.
/// The score bands in [`crate::wizard::scoring`] are calibrated for exactly
/// this list.
pub const SCALE_STATEMENTS: [&str; 6] = [
    "I question my own opinions, positions, and viewpoints because they could be wrong.",
    "I reconsider my opinions when presented with new evidence.",
    "I recognize the value in opinions that are different from my own.",
    "I accept that my beliefs and attitudes may be wrong.",
    "In the face of conflicting evidence, I am open to changing my opinions.",
    "I like finding out new information that differs from what I already think is true.",
];

/// Labels for the five scale points, index 0 = value 1.
pub const SCALE_LABELS: [&str; 5] = [
    "Strongly disagree",
    "Disagree",
    "Neither agree nor disagree",
    "Agree",
    "Strongly agree",
];

/// Open-ended preset questions for the conversational flow.
pub const PRESET_QUESTIONS: [&str; 5] = [
    "Can you describe a time you realized you were wrong about something important? \
     How did you come to that realization, and what did you do afterward?",
    "What is a topic you used to feel very certain about, but now feel less certain \
     about? What made you reconsider?",
    "When you are in a debate and you encounter evidence that contradicts your view, \
     how do you usually respond?",
    "In the areas you know best, do you ever worry that you might still have blind \
     spots? How do you watch out for them?",
    "How do you decide which sources of information you trust and which you don't?",
];

/// Owned copy of a static list, for handing to a session.
pub fn to_owned_list(questions: &[&str]) -> Vec<String> {
    questions.iter().map(|q| q.to_string()).collect()
}

/// Label for a scale value, if it is on the scale.
pub fn scale_label(value: u8) -> Option<&'static str> {
    (1..=5)
        .contains(&value)
        .then(|| SCALE_LABELS[usize::from(value) - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_cover_the_scale() {
        assert_eq!(scale_label(1), Some("Strongly disagree"));
        assert_eq!(scale_label(5), Some("Strongly agree"));
        assert_eq!(scale_label(0), None);
        assert_eq!(scale_label(6), None);
    }

    #[test]
    fn question_lists_are_non_empty() {
        assert!(SCALE_STATEMENTS.iter().all(|q| !q.trim().is_empty()));
        assert!(PRESET_QUESTIONS.iter().all(|q| q.ends_with('?')));
        assert_eq!(to_owned_list(&PRESET_QUESTIONS).len(), 5);
    }
}
