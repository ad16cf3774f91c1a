use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use planner_core::content::{ContentResolver, ContentTable};
use planner_core::model::ChapterContent;
use planner_core::time::fixed_now;
use services::{AppServices, ChapterResearch, Clock, LocalResearch, PlanRequest, ResearchError};

struct OfflineResearch;

#[async_trait]
impl ChapterResearch for OfflineResearch {
    async fn research(
        &self,
        _subject: &str,
        _chapters: &[String],
    ) -> Result<Vec<ChapterContent>, ResearchError> {
        Err(ResearchError::ChapterCountMismatch {
            expected: 1,
            actual: 0,
        })
    }
}

#[tokio::test]
async fn calculus_plan_splits_ten_days_over_two_chapters() {
    let now = fixed_now();
    let research = Arc::new(LocalResearch::builtin().unwrap());
    let app = AppServices::in_memory(Clock::fixed(now), research);

    let request = PlanRequest::new(
        "AP Calculus BC",
        now.date_naive() + Duration::days(10),
        "1-2",
    );
    let (id, plan) = app.plans().create(&request).await.unwrap();

    assert_eq!(plan.total_days(), 10);
    let schedule = plan.schedule();
    assert_eq!(schedule.len(), 2);
    assert_eq!((schedule[0].start_day, schedule[0].end_day), (1, 5));
    assert_eq!((schedule[1].start_day, schedule[1].end_day), (6, 10));
    assert_eq!(schedule[0].start_date, now.date_naive());
    assert_eq!(schedule[1].end_date, now.date_naive() + Duration::days(9));

    let resolver = ContentResolver::new(Arc::new(ContentTable::builtin().unwrap()));
    assert_eq!(
        schedule[0].chapters[0],
        resolver.resolve("ap calculus bc", "Chapter 1")
    );
    assert_eq!(
        schedule[1].chapters[0],
        resolver.resolve("ap calculus bc", "Chapter 2")
    );
    assert!(schedule[0].chapters[0].notes.starts_with("Review limits"));

    let stored = app.plans().load(id).await.unwrap();
    assert_eq!(stored, plan);
}

#[tokio::test]
async fn research_outage_still_produces_a_plan() {
    let now = fixed_now();
    let app = AppServices::in_memory(Clock::fixed(now), Arc::new(OfflineResearch));

    let request = PlanRequest::new("Physics", now.date_naive() + Duration::days(3), "Kinematics, 2");
    let (_, plan) = app.plans().create(&request).await.unwrap();

    let chapters: Vec<_> = plan
        .schedule()
        .iter()
        .map(|phase| phase.chapters[0].clone())
        .collect();
    assert_eq!(
        chapters,
        vec![
            ChapterContent::placeholder("Kinematics"),
            ChapterContent::placeholder("Chapter 2"),
        ]
    );
    let lengths: Vec<_> = plan.schedule().iter().map(|p| p.day_count()).collect();
    assert_eq!(lengths, vec![2, 1]);
}

#[tokio::test]
async fn progress_and_quiz_follow_the_stored_plan() {
    let now = fixed_now();
    let app = AppServices::in_memory(
        Clock::fixed(now),
        Arc::new(LocalResearch::builtin().unwrap()),
    );
    let request = PlanRequest::new("AP Chemistry", now.date_naive() + Duration::days(6), "1-3");
    let (id, plan) = app.plans().create(&request).await.unwrap();

    for index in 0..plan.schedule().len() {
        app.progress().toggle_phase(id, index).await.unwrap();
    }
    let url = plan.schedule()[0].chapters[0].resources[0].url.clone();
    let progress = app.progress().record_resource_visit(id, &url).await.unwrap();
    assert!(progress.all_phases_completed());
    assert_eq!(progress.completion_percent, 100);
    assert_eq!(progress.visited_resources, 1);
    assert_eq!(progress.total_resources, 6);
    assert_eq!(progress.resource_percent, 17);

    let questions = app.quiz().quiz_for(id).await.unwrap();
    assert_eq!(questions.len(), 9);
    assert!(questions.iter().all(|q| q.options.len() == 4));
}
