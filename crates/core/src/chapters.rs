//! Free-text chapter list parsing.
//!
//! Learners type chapters the way they think of them: `1-3, 5`, `Chapter 2-4: review`,
//! or plain names such as `Cell Structure`. This module turns that text into an
//! ordered list of chapter tokens.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// `[chapter ]N-M` anywhere in a segment, with an optional trailing annotation.
static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:chapter\s+)?([0-9]+)\s*-\s*([0-9]+)(?:\s*[:\s].*)?")
        .expect("chapter range pattern should compile")
});

/// Parse a comma-separated chapter list into chapter tokens.
///
/// - ranges expand to `Chapter N` .. `Chapter M` inclusive (empty when `N > M`)
/// - bare numbers become `Chapter <n>`
/// - anything else is kept as a trimmed chapter name
///
/// Empty segments are dropped; order and duplicates are preserved.
///
/// # Examples
///
/// ```
/// # use planner_core::chapters::parse_chapters;
/// assert_eq!(
///     parse_chapters("Intro, 2-3"),
///     vec!["Intro", "Chapter 2", "Chapter 3"]
/// );
/// ```
#[must_use]
pub fn parse_chapters(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for segment in input.split(',').map(str::trim) {
        if segment.is_empty() {
            continue;
        }
        if let Some((start, end)) = parse_range(segment) {
            tokens.extend((start..=end).map(|n| format!("Chapter {n}")));
        } else if segment.bytes().all(|b| b.is_ascii_digit()) {
            tokens.push(format!("Chapter {segment}"));
        } else {
            tokens.push(segment.to_owned());
        }
    }
    tokens
}

/// The chapter text names more chapters than the caller allows.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{count} chapters exceed the limit of {max}")]
pub struct ChapterLimitError {
    pub count: u64,
    pub max: usize,
}

/// Number of tokens `parse_chapters` would produce, without building them.
#[must_use]
pub fn count_chapters(input: &str) -> u64 {
    input
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| match parse_range(segment) {
            Some((start, end)) if start > end => 0,
            Some((start, end)) => u64::from(end - start) + 1,
            None => 1,
        })
        .fold(0, u64::saturating_add)
}

/// Like [`parse_chapters`], but refuses input naming more than `max` chapters
/// before any token is allocated.
///
/// # Errors
///
/// Returns `ChapterLimitError` when the expanded list would exceed `max`.
pub fn parse_chapters_bounded(input: &str, max: usize) -> Result<Vec<String>, ChapterLimitError> {
    let count = count_chapters(input);
    if usize::try_from(count).map_or(true, |count| count > max) {
        return Err(ChapterLimitError { count, max });
    }
    Ok(parse_chapters(input))
}

fn parse_range(segment: &str) -> Option<(u32, u32)> {
    let caps = RANGE_RE.captures(segment)?;
    // Bounds too large for u32 leave the segment as a plain name.
    let start = caps.get(1)?.as_str().parse().ok()?;
    let end = caps.get(2)?.as_str().parse().ok()?;
    Some((start, end))
}
