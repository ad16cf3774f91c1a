use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::content::ChapterContent;
use crate::model::ids::PlanId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlanError {
    #[error("phase {index} is out of range (plan has {len} phases)")]
    PhaseOutOfRange { index: usize, len: usize },

    #[error("resource {url} is not part of this plan")]
    UnknownResource { url: String },
}

//
// ─── PHASE ─────────────────────────────────────────────────────────────────────
//

/// A contiguous block of days assigned to one chapter.
///
/// Days are 1-based and inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub start_day: u32,
    pub end_day: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub chapters: Vec<ChapterContent>,
    #[serde(default)]
    pub completed: bool,
}

impl Phase {
    /// Number of days covered by this phase.
    ///
    /// Zero for an inverted range, which only a corrupt stored plan can hold.
    #[must_use]
    pub fn day_count(&self) -> u32 {
        self.end_day.saturating_add(1).saturating_sub(self.start_day)
    }
}

//
// ─── STUDY PLAN ────────────────────────────────────────────────────────────────
//

/// A generated study schedule plus the learner's local progress annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlan {
    subject: String,
    test_date: NaiveDate,
    total_days: u32,
    schedule: Vec<Phase>,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    visited_resources: BTreeSet<String>,
}

impl StudyPlan {
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        test_date: NaiveDate,
        total_days: u32,
        schedule: Vec<Phase>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject: subject.into(),
            test_date,
            total_days,
            schedule,
            created_at,
            visited_resources: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn test_date(&self) -> NaiveDate {
        self.test_date
    }

    #[must_use]
    pub fn total_days(&self) -> u32 {
        self.total_days
    }

    #[must_use]
    pub fn schedule(&self) -> &[Phase] {
        &self.schedule
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Chapter names in schedule order (first chapter of each phase).
    #[must_use]
    pub fn chapter_names(&self) -> Vec<String> {
        self.schedule
            .iter()
            .map(|phase| {
                phase
                    .chapters
                    .first()
                    .map_or_else(|| "Chapter".to_owned(), |c| c.name.clone())
            })
            .collect()
    }

    /// Flip the completion flag of a phase and return its new state.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::PhaseOutOfRange` for an unknown phase index.
    pub fn toggle_phase(&mut self, index: usize) -> Result<bool, PlanError> {
        let len = self.schedule.len();
        let phase = self
            .schedule
            .get_mut(index)
            .ok_or(PlanError::PhaseOutOfRange { index, len })?;
        phase.completed = !phase.completed;
        Ok(phase.completed)
    }

    /// Mark a resource link as visited.
    ///
    /// Returns `true` the first time a link is recorded.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::UnknownResource` when no phase links to `url`.
    pub fn record_resource_visit(&mut self, url: &str) -> Result<bool, PlanError> {
        let known = self
            .schedule
            .iter()
            .flat_map(|phase| &phase.chapters)
            .flat_map(|chapter| &chapter.resources)
            .any(|resource| resource.url == url);
        if !known {
            return Err(PlanError::UnknownResource {
                url: url.to_owned(),
            });
        }
        Ok(self.visited_resources.insert(self.link_id(url)))
    }

    #[must_use]
    pub fn is_resource_visited(&self, url: &str) -> bool {
        self.visited_resources.contains(&self.link_id(url))
    }

    fn link_id(&self, url: &str) -> String {
        format!("{}-{url}", self.subject)
    }

    /// Snapshot of phase and resource progress.
    #[must_use]
    pub fn progress(&self) -> PlanProgress {
        let total_phases = self.schedule.len();
        let completed_phases = self.schedule.iter().filter(|p| p.completed).count();
        let total_resources = self
            .schedule
            .iter()
            .flat_map(|phase| &phase.chapters)
            .map(|chapter| chapter.resources.len())
            .sum();
        let visited_resources = self.visited_resources.len();

        PlanProgress {
            completed_phases,
            total_phases,
            completion_percent: rounded_percent(completed_phases, total_phases),
            visited_resources,
            total_resources,
            resource_percent: rounded_percent(visited_resources, total_resources),
        }
    }
}

/// Progress figures for a plan, with percentages rounded half-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanProgress {
    pub completed_phases: usize,
    pub total_phases: usize,
    pub completion_percent: u32,
    pub visited_resources: usize,
    pub total_resources: usize,
    pub resource_percent: u32,
}

impl PlanProgress {
    #[must_use]
    pub fn all_phases_completed(&self) -> bool {
        self.total_phases > 0 && self.completed_phases == self.total_phases
    }
}

pub(crate) fn rounded_percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    let scaled = (part * 200 + whole) / (whole * 2);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

//
// ─── SUMMARY ───────────────────────────────────────────────────────────────────
//

/// Lightweight listing entry kept in the plan index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub id: PlanId,
    pub subject: String,
    pub test_date: NaiveDate,
    pub chapters: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl PlanSummary {
    #[must_use]
    pub fn from_plan(id: PlanId, plan: &StudyPlan) -> Self {
        Self {
            id,
            subject: plan.subject().to_owned(),
            test_date: plan.test_date(),
            chapters: plan.chapter_names(),
            created_at: plan.created_at(),
        }
    }
}
