use planner_core::model::{PlanId, PlanProgress};
use storage::PlanStore;
use tracing::debug;

use crate::error::ProgressError;

/// Records the learner's progress annotations on stored plans.
#[derive(Clone)]
pub struct ProgressService {
    plans: PlanStore,
}

impl ProgressService {
    #[must_use]
    pub fn new(plans: PlanStore) -> Self {
        Self { plans }
    }

    /// Flip a phase between done and not done.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Plan` for an unknown phase, or
    /// `ProgressError::Storage` if the plan cannot be loaded or saved.
    pub async fn toggle_phase(
        &self,
        id: PlanId,
        index: usize,
    ) -> Result<PlanProgress, ProgressError> {
        let (completed, progress) = self
            .plans
            .modify(id, |plan| {
                let completed = plan.toggle_phase(index)?;
                Ok::<_, ProgressError>((completed, plan.progress()))
            })
            .await?;
        debug!(%id, index, completed, "phase toggled");
        Ok(progress)
    }

    /// Remember that a resource link was opened.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Plan` if the link is not part of the plan, or
    /// `ProgressError::Storage` on storage failures.
    pub async fn record_resource_visit(
        &self,
        id: PlanId,
        url: &str,
    ) -> Result<PlanProgress, ProgressError> {
        let (first_visit, progress) = self
            .plans
            .modify(id, |plan| {
                let first_visit = plan.record_resource_visit(url)?;
                Ok::<_, ProgressError>((first_visit, plan.progress()))
            })
            .await?;
        if first_visit {
            debug!(%id, %url, "resource visited");
        }
        Ok(progress)
    }

    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the plan cannot be loaded.
    pub async fn progress(&self, id: PlanId) -> Result<PlanProgress, ProgressError> {
        Ok(self.plans.load(id).await?.progress())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use planner_core::model::{ChapterContent, Phase, PlanError, Resource, StudyPlan};
    use planner_core::time::fixed_now;
    use std::sync::Arc;
    use storage::repository::{InMemoryStore, StorageError};

    async fn seeded() -> (ProgressService, PlanId) {
        seeded_with_phases(2).await
    }

    async fn seeded_with_phases(count: u32) -> (ProgressService, PlanId) {
        let store = PlanStore::new(Arc::new(InMemoryStore::new()));
        let today = fixed_now().date_naive();
        let mut chapter = ChapterContent::placeholder("Chapter 1");
        chapter.resources = vec![
            Resource::new("A", "https://a.example"),
            Resource::new("B", "https://b.example"),
        ];
        let mut phases = vec![Phase {
            start_day: 1,
            end_day: 1,
            start_date: today,
            end_date: today,
            chapters: vec![chapter],
            completed: false,
        }];
        for day in 2..=count {
            let date = today + Duration::days(i64::from(day) - 1);
            phases.push(Phase {
                start_day: day,
                end_day: day,
                start_date: date,
                end_date: date,
                chapters: vec![ChapterContent::placeholder(format!("Chapter {day}"))],
                completed: false,
            });
        }
        let test_date = today + Duration::days(i64::from(count));
        let plan = StudyPlan::new("Physics", test_date, count, phases, fixed_now());
        let id = PlanId::generate();
        store.save(id, &plan).await.unwrap();
        (ProgressService::new(store), id)
    }

    #[tokio::test]
    async fn toggling_is_persisted() {
        let (svc, id) = seeded().await;
        let progress = svc.toggle_phase(id, 0).await.unwrap();
        assert_eq!(progress.completion_percent, 50);

        let progress = svc.toggle_phase(id, 1).await.unwrap();
        assert!(progress.all_phases_completed());
        assert_eq!(svc.progress(id).await.unwrap().completed_phases, 2);

        let progress = svc.toggle_phase(id, 1).await.unwrap();
        assert_eq!(progress.completed_phases, 1);
    }

    #[tokio::test]
    async fn visits_count_once() {
        let (svc, id) = seeded().await;
        svc.record_resource_visit(id, "https://a.example").await.unwrap();
        let progress = svc.record_resource_visit(id, "https://a.example").await.unwrap();
        assert_eq!(progress.visited_resources, 1);
        assert_eq!(progress.resource_percent, 50);
    }

    #[tokio::test]
    async fn errors_are_reported() {
        let (svc, id) = seeded().await;
        assert!(matches!(
            svc.toggle_phase(id, 9).await,
            Err(ProgressError::Plan(PlanError::PhaseOutOfRange { .. }))
        ));
        assert!(matches!(
            svc.record_resource_visit(id, "https://elsewhere").await,
            Err(ProgressError::Plan(PlanError::UnknownResource { .. }))
        ));
        assert!(matches!(
            svc.progress(PlanId::generate()).await,
            Err(ProgressError::Storage(StorageError::NotFound))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_toggles_are_all_kept() {
        let (svc, id) = seeded_with_phases(10).await;
        let mut tasks = tokio::task::JoinSet::new();
        for index in 0..10 {
            let svc = svc.clone();
            tasks.spawn(async move { svc.toggle_phase(id, index).await.map(|_| ()) });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap().unwrap();
        }

        let progress = svc.progress(id).await.unwrap();
        assert_eq!(progress.completed_phases, 10);
        assert!(progress.all_phases_completed());
    }
}
