use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use planner_core::chapters::parse_chapters_bounded;
use planner_core::model::{PlanId, PlanSummary, StudyPlan};
use planner_core::scheduler::build_schedule;
use planner_core::time::days_until;
use storage::PlanStore;

use crate::Clock;
use crate::error::{PlanServiceError, PlanValidationError};
use crate::research::{ChapterResearch, research_or_placeholder};

/// Raw plan form input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub subject: String,
    pub test_date: Option<NaiveDate>,
    /// Free-text chapter list, e.g. `1-3, Chapter 5, Kinematics`.
    pub chapters: String,
}

impl PlanRequest {
    #[must_use]
    pub fn new(subject: impl Into<String>, test_date: NaiveDate, chapters: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            test_date: Some(test_date),
            chapters: chapters.into(),
        }
    }
}

/// Validated request, ready for research and scheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ValidatedRequest {
    subject: String,
    test_date: NaiveDate,
    total_days: u32,
    chapters: Vec<String>,
}

/// Builds study plans and manages their storage.
#[derive(Clone)]
pub struct PlanService {
    clock: Clock,
    research: Arc<dyn ChapterResearch>,
    plans: PlanStore,
}

impl PlanService {
    #[must_use]
    pub fn new(clock: Clock, research: Arc<dyn ChapterResearch>, plans: PlanStore) -> Self {
        Self {
            clock,
            research,
            plans,
        }
    }

    /// Assemble a plan without storing it.
    ///
    /// Research failures never abort generation; affected chapters get
    /// placeholder content.
    ///
    /// # Errors
    ///
    /// Returns `PlanServiceError::Validation` for bad input (including more
    /// chapters than days).
    pub async fn generate(&self, request: &PlanRequest) -> Result<StudyPlan, PlanServiceError> {
        let validated = self.validate(request)?;
        let details =
            research_or_placeholder(self.research.as_ref(), &validated.subject, &validated.chapters)
                .await;
        let schedule = build_schedule(validated.total_days, self.clock.today(), details)?;

        Ok(StudyPlan::new(
            validated.subject,
            validated.test_date,
            validated.total_days,
            schedule,
            self.clock.now(),
        ))
    }

    /// Generate a plan and persist it under a fresh id.
    ///
    /// # Errors
    ///
    /// Returns `PlanServiceError` for validation or storage failures.
    pub async fn create(&self, request: &PlanRequest) -> Result<(PlanId, StudyPlan), PlanServiceError> {
        let plan = self.generate(request).await?;
        let id = PlanId::generate();
        self.plans.save(id, &plan).await?;
        info!(%id, subject = %plan.subject(), phases = plan.schedule().len(), "study plan created");
        Ok((id, plan))
    }

    /// # Errors
    ///
    /// Returns `PlanServiceError::Storage` (`NotFound` for unknown ids).
    pub async fn load(&self, id: PlanId) -> Result<StudyPlan, PlanServiceError> {
        Ok(self.plans.load(id).await?)
    }

    /// # Errors
    ///
    /// Returns `PlanServiceError::Storage` if the index cannot be read.
    pub async fn list(&self) -> Result<Vec<PlanSummary>, PlanServiceError> {
        Ok(self.plans.list().await?)
    }

    /// # Errors
    ///
    /// Returns `PlanServiceError::Storage` (`NotFound` for unknown ids).
    pub async fn delete(&self, id: PlanId) -> Result<(), PlanServiceError> {
        self.plans.delete(id).await?;
        info!(%id, "study plan deleted");
        Ok(())
    }

    fn validate(&self, request: &PlanRequest) -> Result<ValidatedRequest, PlanValidationError> {
        let subject = request.subject.trim();
        if subject.is_empty() {
            return Err(PlanValidationError::MissingSubject);
        }
        let test_date = request.test_date.ok_or(PlanValidationError::MissingTestDate)?;
        if request.chapters.trim().is_empty() {
            return Err(PlanValidationError::MissingChapters);
        }

        let total_days = days_until(self.clock.now(), test_date);
        if total_days == 0 {
            return Err(PlanValidationError::TestDateNotInFuture { test_date });
        }

        // Every chapter needs a day; reject before any token or lookup exists.
        let max_chapters = usize::try_from(total_days).unwrap_or(usize::MAX);
        let chapters = parse_chapters_bounded(&request.chapters, max_chapters).map_err(|err| {
            PlanValidationError::ChapterWithoutDays {
                chapters: usize::try_from(err.count).unwrap_or(usize::MAX),
                days: total_days,
            }
        })?;
        if chapters.is_empty() {
            return Err(PlanValidationError::NoValidChapters);
        }

        Ok(ValidatedRequest {
            subject: subject.to_owned(),
            test_date,
            total_days,
            chapters,
        })
    }
}
