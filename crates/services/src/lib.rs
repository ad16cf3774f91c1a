#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod plan_service;
pub mod progress_service;
pub mod quiz_service;
pub mod research;

pub use planner_core::Clock;

pub use app_services::{AppServices, ResearchSource};
pub use error::{
    AppServicesError, PlanServiceError, PlanValidationError, ProgressError, ResearchError,
};
pub use plan_service::{PlanRequest, PlanService};
pub use progress_service::ProgressService;
pub use quiz_service::QuizService;
pub use research::{ChapterResearch, HttpResearchClient, LocalResearch, ResearchConfig};
