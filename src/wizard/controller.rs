//! Linear wizard controller for the Likert questionnaire.

use serde::Serialize;

use crate::error::SurveyError;
use crate::session::model::Response;

use super::scoring::ScoreSummary;

/// Outcome of a successful `advance()`.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Moved to the question at `index`.
    Moved { index: usize },
    /// The last question was answered; the questionnaire is complete.
    Completed(ScoreSummary),
}

/// What the presentation layer should show for a wizard session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum WizardView {
    Question {
        index: usize,
        total: usize,
        statement: String,
        selected: Option<u8>,
        answered: usize,
        can_go_back: bool,
        can_advance: bool,
    },
    Results {
        summary: ScoreSummary,
        comparison: String,
    },
}

/// Drives a fixed list of scale statements one screen at a time (or all at
/// once through [`WizardController::submit_all`]).
///
/// `index` ranges over `0..=N`; it equals `N` only once the questionnaire is
/// completed.
#[derive(Debug, Clone)]
pub struct WizardController {
    questions: Vec<String>,
    answers: Vec<Option<u8>>,
    index: usize,
    completed: bool,
    responses: Vec<Response>,
}

impl WizardController {
    pub fn new(questions: Vec<String>) -> Result<Self, SurveyError> {
        if questions.is_empty() {
            return Err(SurveyError::NoQuestions);
        }
        let answers = vec![None; questions.len()];
        Ok(Self {
            questions,
            answers,
            index: 0,
            completed: false,
            responses: Vec::new(),
        })
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current_question(&self) -> Option<&str> {
        self.questions.get(self.index).map(String::as_str)
    }

    pub fn answer(&self, index: usize) -> Option<u8> {
        self.answers.get(index).copied().flatten()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Frozen responses; empty until the questionnaire is completed.
    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    /// Indices of questions without an answer, in order.
    pub fn unanswered(&self) -> Vec<usize> {
        self.answers
            .iter()
            .enumerate()
            .filter(|(_, a)| a.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// Record (or overwrite) the answer for `index`.
    pub fn select_answer(&mut self, index: usize, value: u8) -> Result<(), SurveyError> {
        if self.completed {
            return Err(SurveyError::AlreadyCompleted);
        }
        if index >= self.questions.len() {
            return Err(SurveyError::InvalidIndex {
                index,
                count: self.questions.len(),
            });
        }
        if !(1..=5).contains(&value) {
            return Err(SurveyError::InvalidValue { value });
        }
        self.answers[index] = Some(value);
        tracing::debug!(index, value, "Answer selected");
        Ok(())
    }

    /// Move past the current question, which must be answered.
    pub fn advance(&mut self) -> Result<Advance, SurveyError> {
        if self.completed {
            return Err(SurveyError::AlreadyCompleted);
        }
        if self.answers[self.index].is_none() {
            return Err(SurveyError::MissingAnswer { index: self.index });
        }
        self.index += 1;
        if self.index < self.questions.len() {
            return Ok(Advance::Moved { index: self.index });
        }
        Ok(Advance::Completed(self.complete()))
    }

    /// Step back one question. Prior answers are kept.
    pub fn retreat(&mut self) -> Result<usize, SurveyError> {
        if self.completed {
            return Err(SurveyError::AlreadyCompleted);
        }
        if self.index == 0 {
            return Err(SurveyError::AtFirstQuestion);
        }
        self.index -= 1;
        Ok(self.index)
    }

    /// Complete the questionnaire in one step; every question must be answered.
    pub fn submit_all(&mut self) -> Result<ScoreSummary, SurveyError> {
        if self.completed {
            return Err(SurveyError::AlreadyCompleted);
        }
        let missing = self.unanswered();
        if !missing.is_empty() {
            return Err(SurveyError::MissingAnswers { indices: missing });
        }
        self.index = self.questions.len();
        Ok(self.complete())
    }

    /// Sum of the answers recorded so far against the full questionnaire.
    pub fn compute_score(&self) -> ScoreSummary {
        let total = self.answers.iter().flatten().map(|v| u32::from(*v)).sum();
        ScoreSummary::from_total(total, self.questions.len())
    }

    /// Score of the completed questionnaire.
    pub fn score(&self) -> Option<ScoreSummary> {
        self.completed.then(|| self.compute_score())
    }

    pub fn reset(&mut self) {
        self.answers = vec![None; self.questions.len()];
        self.index = 0;
        self.completed = false;
        self.responses.clear();
    }

    pub fn view(&self) -> WizardView {
        if self.completed {
            let summary = self.compute_score();
            let comparison = summary.comparison();
            return WizardView::Results {
                summary,
                comparison,
            };
        }
        WizardView::Question {
            index: self.index,
            total: self.questions.len(),
            statement: self.questions[self.index].clone(),
            selected: self.answers[self.index],
            answered: self.answers.iter().filter(|a| a.is_some()).count(),
            can_go_back: self.index > 0,
            can_advance: self.answers[self.index].is_some(),
        }
    }

    fn complete(&mut self) -> ScoreSummary {
        self.responses = self
            .questions
            .iter()
            .zip(&self.answers)
            .filter_map(|(q, a)| a.map(|v| Response::scale(q.clone(), v)))
            .collect();
        self.completed = true;
        let summary = self.compute_score();
        tracing::info!(
            total = summary.total,
            max = summary.max,
            band = %summary.band,
            "Scale questionnaire completed"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::{SCALE_STATEMENTS, to_owned_list};
    use crate::wizard::scoring::Band;

    fn wizard() -> WizardController {
        WizardController::new(to_owned_list(&SCALE_STATEMENTS)).unwrap()
    }

    fn answer_all(w: &mut WizardController, values: &[u8]) -> Advance {
        let mut last = None;
        for value in values {
            let index = w.current_index();
            w.select_answer(index, *value).unwrap();
            last = Some(w.advance().unwrap());
        }
        last.unwrap()
    }

    #[test]
    fn empty_question_list_rejected() {
        assert!(matches!(
            WizardController::new(vec![]),
            Err(SurveyError::NoQuestions)
        ));
    }

    #[test]
    fn select_answer_validates_and_overwrites() {
        let mut w = wizard();
        assert!(matches!(
            w.select_answer(6, 3),
            Err(SurveyError::InvalidIndex { index: 6, count: 6 })
        ));
        assert!(matches!(
            w.select_answer(0, 0),
            Err(SurveyError::InvalidValue { value: 0 })
        ));
        assert!(matches!(
            w.select_answer(0, 6),
            Err(SurveyError::InvalidValue { value: 6 })
        ));
        assert_eq!(w.answer(0), None);

        w.select_answer(0, 2).unwrap();
        w.select_answer(0, 4).unwrap();
        assert_eq!(w.answer(0), Some(4));
    }

    #[test]
    fn advance_requires_current_answer() {
        let mut w = wizard();
        let err = w.advance().unwrap_err();
        assert!(matches!(err, SurveyError::MissingAnswer { index: 0 }));
        assert_eq!(w.current_index(), 0);
        assert!(!w.is_completed());

        w.select_answer(0, 3).unwrap();
        assert_eq!(w.advance().unwrap(), Advance::Moved { index: 1 });
    }

    #[test]
    fn advancing_past_last_question_completes() {
        let mut w = wizard();
        let outcome = answer_all(&mut w, &[5, 5, 4, 4, 4, 4]);
        match outcome {
            Advance::Completed(summary) => {
                assert_eq!(summary.total, 26);
                assert_eq!(summary.band, Band::TopQuartile);
            }
            other => panic!("expected completion, got {other:?}"),
        }
        assert!(w.is_completed());
        assert_eq!(w.current_index(), 6);
        assert_eq!(w.responses().len(), 6);
        assert_eq!(w.responses()[0], Response::scale(SCALE_STATEMENTS[0], 5));
    }

    #[test]
    fn refused_advance_at_last_question_leaves_state() {
        let mut w = wizard();
        for i in 0..5 {
            w.select_answer(i, 3).unwrap();
            w.advance().unwrap();
        }
        assert_eq!(w.current_index(), 5);
        assert!(w.advance().is_err());
        assert_eq!(w.current_index(), 5);
        assert!(!w.is_completed());
        assert!(w.responses().is_empty());
    }

    #[test]
    fn retreat_bounds() {
        let mut w = wizard();
        assert!(matches!(w.retreat(), Err(SurveyError::AtFirstQuestion)));
        w.select_answer(0, 1).unwrap();
        w.advance().unwrap();
        assert_eq!(w.retreat().unwrap(), 0);
        assert_eq!(w.answer(0), Some(1));
    }

    #[test]
    fn submit_all_lists_missing_answers() {
        let mut w = wizard();
        w.select_answer(0, 4).unwrap();
        w.select_answer(2, 4).unwrap();
        match w.submit_all() {
            Err(SurveyError::MissingAnswers { indices }) => {
                assert_eq!(indices, vec![1, 3, 4, 5]);
            }
            other => panic!("expected missing answers, got {other:?}"),
        }
        assert!(!w.is_completed());
        assert_eq!(w.current_index(), 0);
        assert!(w.responses().is_empty());
    }

    #[test]
    fn submit_all_freezes_responses() {
        let mut w = wizard();
        for i in 0..6 {
            w.select_answer(i, 3).unwrap();
        }
        let summary = w.submit_all().unwrap();
        assert_eq!(summary.total, 18);
        assert_eq!(summary.band, Band::BottomQuartile);
        assert!(w.is_completed());
        assert!(matches!(w.select_answer(0, 5), Err(SurveyError::AlreadyCompleted)));
        assert!(matches!(w.submit_all(), Err(SurveyError::AlreadyCompleted)));
        assert!(matches!(w.retreat(), Err(SurveyError::AlreadyCompleted)));
    }

    #[test]
    fn score_bounds_hold_for_partial_answers() {
        let mut w = wizard();
        assert_eq!(w.compute_score().total, 0);
        w.select_answer(3, 5).unwrap();
        let summary = w.compute_score();
        assert_eq!(summary.total, 5);
        assert!(summary.total <= summary.max);
        assert_eq!(summary.max, 30);
        assert!(w.score().is_none());
    }

    #[test]
    fn reset_then_replay_is_idempotent() {
        let values = [4, 4, 4, 4, 3, 3];
        let mut w = wizard();
        let first = match answer_all(&mut w, &values) {
            Advance::Completed(s) => s,
            other => panic!("unexpected {other:?}"),
        };

        w.reset();
        assert!(!w.is_completed());
        assert_eq!(w.current_index(), 0);
        assert_eq!(w.unanswered().len(), 6);
        assert!(w.responses().is_empty());

        let second = match answer_all(&mut w, &values) {
            Advance::Completed(s) => s,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(first, second);
        assert_eq!(second.band, Band::Middle);
    }

    #[test]
    fn view_reflects_progress() {
        let mut w = wizard();
        match w.view() {
            WizardView::Question {
                index,
                total,
                can_go_back,
                can_advance,
                ..
            } => {
                assert_eq!((index, total), (0, 6));
                assert!(!can_go_back);
                assert!(!can_advance);
            }
            other => panic!("unexpected {other:?}"),
        }

        answer_all(&mut w, &[5; 6]);
        match w.view() {
            WizardView::Results { summary, comparison } => {
                assert_eq!(summary.total, 30);
                assert!(comparison.contains("top quartile"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
