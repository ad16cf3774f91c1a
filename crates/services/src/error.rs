//! Shared error types for the services crate.

use chrono::NaiveDate;
use thiserror::Error;

use planner_core::content::ContentTableError;
use planner_core::model::PlanError;
use planner_core::scheduler::ScheduleError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Problems with user input; no plan is created.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlanValidationError {
    #[error("please choose a subject")]
    MissingSubject,
    #[error("please choose a test date")]
    MissingTestDate,
    #[error("please enter the chapters to study")]
    MissingChapters,
    #[error("test date {test_date} must be in the future")]
    TestDateNotInFuture { test_date: NaiveDate },
    #[error("please enter valid chapter numbers or names")]
    NoValidChapters,
    #[error("{chapters} chapters do not fit into the {days} days before the test")]
    ChapterWithoutDays { chapters: usize, days: u32 },
}

/// Errors emitted by chapter research backends.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResearchError {
    #[error("research request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("research returned {actual} chapters, expected {expected}")]
    ChapterCountMismatch { expected: usize, actual: usize },
}

/// Errors emitted by `PlanService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlanServiceError {
    #[error(transparent)]
    Validation(#[from] PlanValidationError),
    #[error(transparent)]
    Schedule(ScheduleError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ScheduleError> for PlanServiceError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::ChapterWithoutDays { chapters, days } => {
                Self::Validation(PlanValidationError::ChapterWithoutDays { chapters, days })
            }
            other => Self::Schedule(other),
        }
    }
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    ContentTable(#[from] ContentTableError),
    #[error(transparent)]
    Research(#[from] ResearchError),
    #[error("cannot read content table {path}: {source}")]
    ContentFile {
        path: String,
        source: std::io::Error,
    },
}
