use std::collections::HashMap;

use rand::Rng;
use rand::seq::SliceRandom;

use planner_core::model::{PlanId, StudyPlan};
use planner_core::quiz::{QuizQuestion, QuizScore, draft_questions, score};
use storage::PlanStore;
use storage::repository::StorageError;

/// Builds shuffled quizzes from stored plans and grades answers.
#[derive(Clone)]
pub struct QuizService {
    plans: PlanStore,
}

impl QuizService {
    #[must_use]
    pub fn new(plans: PlanStore) -> Self {
        Self { plans }
    }

    /// Quiz for a stored plan with options shuffled by the thread RNG.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the plan cannot be loaded.
    pub async fn quiz_for(&self, id: PlanId) -> Result<Vec<QuizQuestion>, StorageError> {
        let plan = self.plans.load(id).await?;
        Ok(build_quiz(&plan, &mut rand::rng()))
    }

    /// Grade answers (question id -> chosen option index).
    #[must_use]
    pub fn grade(questions: &[QuizQuestion], answers: &HashMap<usize, usize>) -> QuizScore {
        score(questions, answers)
    }
}

/// Questions for `plan` with each question's options shuffled.
pub fn build_quiz<R: Rng + ?Sized>(plan: &StudyPlan, rng: &mut R) -> Vec<QuizQuestion> {
    draft_questions(plan)
        .into_iter()
        .map(|question| shuffle_options(question, rng))
        .collect()
}

fn shuffle_options<R: Rng + ?Sized>(mut question: QuizQuestion, rng: &mut R) -> QuizQuestion {
    let mut order: Vec<usize> = (0..question.options.len()).collect();
    order.shuffle(rng);

    let correct = order
        .iter()
        .position(|&original| original == question.correct)
        .unwrap_or(question.correct);
    question.options = order
        .iter()
        .map(|&original| question.options[original].clone())
        .collect();
    question.correct = correct;
    question
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use planner_core::model::{ChapterContent, Phase};
    use planner_core::quiz::Verdict;
    use planner_core::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Arc;
    use storage::repository::InMemoryStore;

    fn plan() -> StudyPlan {
        let today = fixed_now().date_naive();
        let mut chapter = ChapterContent::placeholder("Chapter 1");
        chapter.key_points = (0..6).map(|i| format!("point {i}")).collect();
        let phase = Phase {
            start_day: 1,
            end_day: 1,
            start_date: today,
            end_date: today,
            chapters: vec![chapter],
            completed: false,
        };
        StudyPlan::new("Physics", today + Duration::days(1), 1, vec![phase], fixed_now())
    }

    #[test]
    fn shuffling_keeps_the_right_answer_reachable() {
        let plan = plan();
        let drafts = draft_questions(&plan);
        let mut rng = StdRng::seed_from_u64(7);
        let questions = build_quiz(&plan, &mut rng);

        assert_eq!(questions.len(), 3);
        for (draft, question) in drafts.iter().zip(&questions) {
            assert_eq!(question.options[question.correct], draft.options[0]);
            let mut sorted = question.options.clone();
            sorted.sort();
            let mut expected = draft.options.clone();
            expected.sort();
            assert_eq!(sorted, expected);
        }
    }

    #[test]
    fn perfect_answers_score_excellent() {
        let mut rng = StdRng::seed_from_u64(11);
        let questions = build_quiz(&plan(), &mut rng);
        let answers: HashMap<_, _> = questions.iter().map(|q| (q.id, q.correct)).collect();
        let result = QuizService::grade(&questions, &answers);
        assert_eq!(result.percent, 100);
        assert_eq!(result.verdict, Verdict::Excellent);
    }

    #[tokio::test]
    async fn quiz_for_loads_stored_plan() {
        let store = PlanStore::new(Arc::new(InMemoryStore::new()));
        let id = PlanId::generate();
        store.save(id, &plan()).await.unwrap();

        let svc = QuizService::new(store);
        let questions = svc.quiz_for(id).await.unwrap();
        assert_eq!(questions.len(), 3);
        assert!(matches!(
            svc.quiz_for(PlanId::generate()).await,
            Err(StorageError::NotFound)
        ));
    }
}
