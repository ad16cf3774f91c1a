use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ChapterContent, Phase};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScheduleError {
    #[error("a schedule needs at least one day")]
    NoDays,
    #[error("a schedule needs at least one chapter")]
    NoChapters,
    #[error("{chapters} chapters do not fit into {days} days")]
    ChapterWithoutDays { chapters: usize, days: u32 },
    #[error("phase dates overflow the calendar")]
    DateOutOfRange,
}

//
// ─── DAY RANGES ────────────────────────────────────────────────────────────────
//

/// Inclusive, 1-based day range of one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRange {
    pub start_day: u32,
    pub end_day: u32,
}

/// Split `total_days` over `chapter_count` phases.
///
/// Every phase receives `total_days / chapter_count` days and the first
/// `total_days % chapter_count` phases receive one extra day, so the lengths
/// always sum to `total_days`. Lengths may be zero when there are more
/// chapters than days.
///
/// # Examples
///
/// ```
/// # use planner_core::scheduler::allocate_days;
/// assert_eq!(allocate_days(10, 3), vec![4, 3, 3]);
/// ```
#[must_use]
pub fn allocate_days(total_days: u32, chapter_count: usize) -> Vec<u32> {
    if chapter_count == 0 {
        return Vec::new();
    }
    let Ok(count) = u32::try_from(chapter_count) else {
        // More phases than any u32 day count: nobody gets more than one day.
        return (0..chapter_count)
            .map(|i| u32::from(i < total_days as usize))
            .collect();
    };
    let base = total_days / count;
    let remainder = total_days % count;
    (0..count)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// Running day ranges for the lengths produced by [`allocate_days`].
///
/// # Errors
///
/// Returns `ScheduleError::ChapterWithoutDays` if any phase would be empty.
pub fn day_ranges(total_days: u32, chapter_count: usize) -> Result<Vec<DayRange>, ScheduleError> {
    if total_days == 0 {
        return Err(ScheduleError::NoDays);
    }
    if chapter_count == 0 {
        return Err(ScheduleError::NoChapters);
    }

    let lengths = allocate_days(total_days, chapter_count);
    if lengths.contains(&0) {
        return Err(ScheduleError::ChapterWithoutDays {
            chapters: chapter_count,
            days: total_days,
        });
    }

    let mut next_day = 1;
    Ok(lengths
        .into_iter()
        .map(|len| {
            let range = DayRange {
                start_day: next_day,
                end_day: next_day + len - 1,
            };
            next_day += len;
            range
        })
        .collect())
}

/// Build one phase per chapter, in input order, anchored at `first_day`.
///
/// # Errors
///
/// Returns `ScheduleError` if there are no days, no chapters, more chapters
/// than days, or the dates cannot be represented.
pub fn build_schedule(
    total_days: u32,
    first_day: NaiveDate,
    chapters: Vec<ChapterContent>,
) -> Result<Vec<Phase>, ScheduleError> {
    let ranges = day_ranges(total_days, chapters.len())?;

    ranges
        .into_iter()
        .zip(chapters)
        .map(|(range, chapter)| {
            Ok(Phase {
                start_day: range.start_day,
                end_day: range.end_day,
                start_date: offset_date(first_day, range.start_day)?,
                end_date: offset_date(first_day, range.end_day)?,
                chapters: vec![chapter],
                completed: false,
            })
        })
        .collect()
}

fn offset_date(first_day: NaiveDate, day: u32) -> Result<NaiveDate, ScheduleError> {
    first_day
        .checked_add_days(Days::new(u64::from(day - 1)))
        .ok_or(ScheduleError::DateOutOfRange)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapters(n: usize) -> Vec<ChapterContent> {
        (1..=n)
            .map(|i| ChapterContent::placeholder(format!("Chapter {i}")))
            .collect()
    }

    #[test]
    fn allocation_sums_to_total_with_front_loaded_remainder() {
        for total in 1..=40_u32 {
            for count in 1..=12_usize {
                let lengths = allocate_days(total, count);
                assert_eq!(lengths.len(), count);
                assert_eq!(lengths.iter().sum::<u32>(), total);

                let base = total / count as u32;
                let remainder = (total % count as u32) as usize;
                for (i, len) in lengths.iter().enumerate() {
                    let expected = if i < remainder { base + 1 } else { base };
                    assert_eq!(*len, expected, "total={total} count={count} i={i}");
                }
            }
        }
    }

    #[test]
    fn ranges_are_contiguous_from_day_one() {
        let ranges = day_ranges(17, 5).unwrap();
        assert_eq!(ranges[0].start_day, 1);
        for pair in ranges.windows(2) {
            assert_eq!(pair[1].start_day, pair[0].end_day + 1);
        }
        assert_eq!(ranges.last().unwrap().end_day, 17);
    }

    #[test]
    fn more_chapters_than_days_is_rejected() {
        assert_eq!(allocate_days(2, 3), vec![1, 1, 0]);
        assert_eq!(
            day_ranges(2, 3),
            Err(ScheduleError::ChapterWithoutDays { chapters: 3, days: 2 })
        );
    }

    #[test]
    fn empty_inputs_are_rejected() {
        assert_eq!(day_ranges(0, 3), Err(ScheduleError::NoDays));
        assert_eq!(day_ranges(3, 0), Err(ScheduleError::NoChapters));
        assert!(allocate_days(5, 0).is_empty());
    }

    #[test]
    fn schedule_dates_follow_day_offsets() {
        let first = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        let phases = build_schedule(10, first, chapters(2)).unwrap();

        assert_eq!(phases.len(), 2);
        assert_eq!((phases[0].start_day, phases[0].end_day), (1, 5));
        assert_eq!((phases[1].start_day, phases[1].end_day), (6, 10));
        assert_eq!(phases[0].start_date, first);
        // 2024 is a leap year
        assert_eq!(phases[0].end_date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(phases[1].start_date, NaiveDate::from_ymd_opt(2024, 3, 3).unwrap());
        assert_eq!(phases[1].end_date, NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
        assert!(phases.iter().all(|p| !p.completed && p.chapters.len() == 1));
    }

    #[test]
    fn schedule_keeps_chapter_order() {
        let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let phases = build_schedule(7, first, chapters(3)).unwrap();
        let names: Vec<_> = phases.iter().map(|p| p.chapters[0].name.as_str()).collect();
        assert_eq!(names, vec!["Chapter 1", "Chapter 2", "Chapter 3"]);
        let lengths: Vec<_> = phases.iter().map(Phase::day_count).collect();
        assert_eq!(lengths, vec![3, 2, 2]);
    }
}
