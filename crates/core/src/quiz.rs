//! Self-check quiz built from a plan's key points.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::StudyPlan;
use crate::model::plan::rounded_percent;

/// Questions drawn per chapter.
pub const POINTS_PER_CHAPTER: usize = 3;
/// Upper bound on questions in one quiz.
pub const MAX_QUESTIONS: usize = 10;
/// Options offered per question.
pub const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: usize,
    pub chapter: String,
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options` of the right answer.
    pub correct: usize,
}

impl QuizQuestion {
    /// Options are compared by text, so a repeated correct option also counts.
    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        match (self.options.get(option), self.options.get(self.correct)) {
            (Some(chosen), Some(right)) => chosen == right,
            _ => false,
        }
    }
}

/// Unshuffled questions for a plan; the right answer is always option 0.
///
/// For the i-th of the first three key points of a chapter, the options are
/// key points i..=i+3 wrapping around the chapter's list.
#[must_use]
pub fn draft_questions(plan: &StudyPlan) -> Vec<QuizQuestion> {
    let mut questions = Vec::new();
    let chapters = plan.schedule().iter().flat_map(|phase| &phase.chapters);

    for chapter in chapters {
        let points = &chapter.key_points;
        if points.is_empty() {
            continue;
        }
        for i in 0..points.len().min(POINTS_PER_CHAPTER) {
            if questions.len() == MAX_QUESTIONS {
                return questions;
            }
            let options = (0..OPTIONS_PER_QUESTION)
                .map(|offset| points[(i + offset) % points.len()].clone())
                .collect();
            questions.push(QuizQuestion {
                id: questions.len(),
                chapter: chapter.name.clone(),
                question: format!(
                    "Which of the following best describes a key concept from \"{}\"?",
                    chapter.name
                ),
                options,
                correct: 0,
            });
        }
    }
    questions
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Excellent!")]
    Excellent,
    #[serde(rename = "Good Job!")]
    GoodJob,
    #[serde(rename = "Keep Studying!")]
    KeepStudying,
}

impl Verdict {
    #[must_use]
    pub fn from_percent(percent: u32) -> Self {
        match percent {
            80.. => Self::Excellent,
            60..=79 => Self::GoodJob,
            _ => Self::KeepStudying,
        }
    }

    #[must_use]
    pub fn advice(self) -> &'static str {
        match self {
            Self::Excellent => "You have mastered the material. Keep it up!",
            Self::GoodJob => "You have a solid understanding. Review the weaker areas.",
            Self::KeepStudying => "Review the study material and retake the quiz.",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Excellent => "Excellent!",
            Self::GoodJob => "Good Job!",
            Self::KeepStudying => "Keep Studying!",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
    pub percent: u32,
    pub verdict: Verdict,
}

/// Score answers keyed by question id (value = chosen option index).
///
/// Unanswered questions count as wrong.
#[must_use]
pub fn score(questions: &[QuizQuestion], answers: &HashMap<usize, usize>) -> QuizScore {
    let correct = questions
        .iter()
        .filter(|q| answers.get(&q.id).is_some_and(|choice| q.is_correct(*choice)))
        .count();
    let percent = rounded_percent(correct, questions.len());
    QuizScore {
        correct,
        total: questions.len(),
        percent,
        verdict: Verdict::from_percent(percent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChapterContent, Phase};
    use crate::time::fixed_now;

    fn plan_with(points: &[usize]) -> StudyPlan {
        let today = fixed_now().date_naive();
        let schedule = points
            .iter()
            .enumerate()
            .map(|(i, n)| Phase {
                start_day: i as u32 + 1,
                end_day: i as u32 + 1,
                start_date: today,
                end_date: today,
                chapters: vec![ChapterContent {
                    name: format!("Chapter {}", i + 1),
                    notes: String::new(),
                    key_points: (0..*n).map(|k| format!("c{}p{k}", i + 1)).collect(),
                    resources: Vec::new(),
                }],
                completed: false,
            })
            .collect::<Vec<_>>();
        StudyPlan::new("Subject", today, schedule.len() as u32, schedule, fixed_now())
    }

    #[test]
    fn draws_first_three_points_per_chapter() {
        let questions = draft_questions(&plan_with(&[5, 2, 0]));
        assert_eq!(questions.len(), 5);
        assert_eq!(
            questions[0].options,
            vec!["c1p0", "c1p1", "c1p2", "c1p3"]
        );
        assert_eq!(questions[2].options[0], "c1p2");
        assert_eq!(questions[2].options[3], "c1p0");
        // two points wrap around
        assert_eq!(questions[4].options, vec!["c2p1", "c2p0", "c2p1", "c2p0"]);
        assert!(questions.iter().all(|q| q.correct == 0));
        assert_eq!(
            questions[3].question,
            "Which of the following best describes a key concept from \"Chapter 2\"?"
        );
    }

    #[test]
    fn caps_at_ten_questions_with_sequential_ids() {
        let questions = draft_questions(&plan_with(&[10, 10, 10, 10]));
        assert_eq!(questions.len(), MAX_QUESTIONS);
        assert!(questions.iter().enumerate().all(|(i, q)| q.id == i));
    }

    #[test]
    fn scoring_counts_unanswered_as_wrong() {
        let questions = draft_questions(&plan_with(&[5, 5]));
        let mut answers = HashMap::new();
        answers.insert(0, 0);
        answers.insert(1, 0);
        answers.insert(2, 0);
        answers.insert(3, 2);
        let result = score(&questions, &answers);
        assert_eq!(result.correct, 3);
        assert_eq!(result.total, 6);
        assert_eq!(result.percent, 50);
        assert_eq!(result.verdict, Verdict::KeepStudying);
    }

    #[test]
    fn repeated_option_text_counts_as_correct() {
        let questions = draft_questions(&plan_with(&[2]));
        // options: c1p0, c1p1, c1p0, c1p1
        assert!(questions[0].is_correct(2));
        assert!(!questions[0].is_correct(1));
        assert!(!questions[0].is_correct(7));
    }

    #[test]
    fn verdict_thresholds() {
        assert_eq!(Verdict::from_percent(100).to_string(), "Excellent!");
        assert_eq!(Verdict::from_percent(80), Verdict::Excellent);
        assert_eq!(Verdict::from_percent(60), Verdict::GoodJob);
        assert_eq!(Verdict::from_percent(59), Verdict::KeepStudying);
    }

    #[test]
    fn verdict_serializes_as_its_label() {
        for verdict in [Verdict::Excellent, Verdict::GoodJob, Verdict::KeepStudying] {
            let json = serde_json::to_value(verdict).unwrap();
            assert_eq!(json, serde_json::Value::String(verdict.to_string()));
            assert_eq!(serde_json::from_value::<Verdict>(json).unwrap(), verdict);
        }
    }

    #[test]
    fn empty_quiz_scores_zero() {
        let result = score(&[], &HashMap::new());
        assert_eq!(result.percent, 0);
        assert_eq!(result.total, 0);
    }
}
