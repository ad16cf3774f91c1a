//! Plain-text rendering for the command line front end.

use std::collections::HashMap;

use planner_core::model::{PlanId, PlanProgress, PlanSummary, StudyPlan};
use planner_core::quiz::QuizQuestion;
use services::QuizService;
use tokio::io::{AsyncBufReadExt, BufReader};

const OPTION_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

pub fn print_plan(id: PlanId, plan: &StudyPlan) {
    println!("Plan {id}");
    println!(
        "{} - test on {} ({} days)",
        plan.subject(),
        plan.test_date(),
        plan.total_days()
    );
    for (index, phase) in plan.schedule().iter().enumerate() {
        let mark = if phase.completed { "x" } else { " " };
        let names: Vec<_> = phase.chapters.iter().map(|c| c.name.as_str()).collect();
        println!();
        println!(
            "[{mark}] Phase {}: days {}-{} ({} to {}) {}",
            index + 1,
            phase.start_day,
            phase.end_day,
            phase.start_date,
            phase.end_date,
            names.join(", ")
        );
        for chapter in &phase.chapters {
            println!("    {}", chapter.notes);
            for point in &chapter.key_points {
                println!("    - {point}");
            }
            for resource in &chapter.resources {
                let seen = if plan.is_resource_visited(&resource.url) {
                    " (visited)"
                } else {
                    ""
                };
                println!("    * {}: {}{seen}", resource.title, resource.url);
            }
        }
    }
}

pub fn print_summaries(summaries: &[PlanSummary]) {
    if summaries.is_empty() {
        println!("No saved plans.");
        return;
    }
    for summary in summaries {
        println!(
            "{}  {}  test {}  chapters: {}",
            summary.id,
            summary.subject,
            summary.test_date,
            summary.chapters.join(", ")
        );
    }
}

pub fn print_progress(progress: &PlanProgress) {
    println!(
        "Phases: {}/{} ({}%)",
        progress.completed_phases, progress.total_phases, progress.completion_percent
    );
    println!(
        "Resources: {}/{} ({}%)",
        progress.visited_resources, progress.total_resources, progress.resource_percent
    );
    if progress.all_phases_completed() {
        println!("All phases complete. Time for the quiz!");
    }
}

/// Read `A`-`D` (or `1`-`4`); anything else leaves the question unanswered.
fn parse_answer(line: &str) -> Option<usize> {
    let line = line.trim();
    let mut chars = line.chars();
    let (first, rest) = (chars.next()?, chars.next());
    if rest.is_some() {
        return None;
    }
    let upper = first.to_ascii_uppercase();
    OPTION_LABELS
        .iter()
        .position(|label| *label == upper)
        .or_else(|| {
            first
                .to_digit(10)
                .and_then(|d| (1..=4).contains(&d).then(|| d as usize - 1))
        })
}

pub async fn run_quiz(questions: &[QuizQuestion]) -> std::io::Result<()> {
    if questions.is_empty() {
        println!("This plan has no key points to quiz on.");
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut answers = HashMap::new();
    for question in questions {
        println!();
        println!("{}. {}", question.id + 1, question.question);
        for (label, option) in OPTION_LABELS.iter().zip(&question.options) {
            println!("   {label}) {option}");
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if let Some(choice) = parse_answer(&line) {
            answers.insert(question.id, choice);
        }
    }

    let score = QuizService::grade(questions, &answers);
    println!();
    println!(
        "{} {}/{} correct ({}%)",
        score.verdict, score.correct, score.total, score.percent
    );
    println!("{}", score.verdict.advice());
    Ok(())
}
