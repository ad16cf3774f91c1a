mod content;
mod ids;
pub(crate) mod plan;

pub use content::{ChapterContent, Resource};
pub use ids::{ParseIdError, PlanId};
pub use plan::{Phase, PlanError, PlanProgress, PlanSummary, StudyPlan};
