use std::sync::Arc;

use crate::content::table::{ChapterEntry, ContentTable};
use crate::model::{ChapterContent, Resource};

/// How a chapter was resolved against the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    /// Matched a differing table key by substring.
    Partial { key: String },
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub content: ChapterContent,
    pub kind: MatchKind,
}

/// Resolves `(subject, chapter)` pairs into study content.
///
/// Lookup order: exact key, then the best substring match within the subject,
/// then a generic generated record. Resolution never fails and has no side
/// effects, so one resolver can be shared freely across tasks.
#[derive(Debug, Clone)]
pub struct ContentResolver {
    table: Arc<ContentTable>,
}

impl ContentResolver {
    #[must_use]
    pub fn new(table: Arc<ContentTable>) -> Self {
        Self { table }
    }

    #[must_use]
    pub fn table(&self) -> &ContentTable {
        &self.table
    }

    /// Resolve content for a chapter. The returned record is an owned copy.
    #[must_use]
    pub fn resolve(&self, subject: &str, chapter: &str) -> ChapterContent {
        self.resolve_with_kind(subject, chapter).content
    }

    #[must_use]
    pub fn resolve_with_kind(&self, subject: &str, chapter: &str) -> Resolution {
        let subject_key = normalize_subject(subject);
        let chapter_key = chapter.to_lowercase();

        if let Some(entries) = self.table.subject(&subject_key) {
            if let Some(entry) = entries.iter().find(|e| e.key == chapter_key) {
                return Resolution {
                    content: entry.to_content(chapter),
                    kind: MatchKind::Exact,
                };
            }
            if let Some(entry) = best_partial_match(entries, &chapter_key) {
                return Resolution {
                    content: entry.to_content(chapter),
                    kind: MatchKind::Partial {
                        key: entry.key.clone(),
                    },
                };
            }
        }

        Resolution {
            content: fallback_content(subject, chapter),
            kind: MatchKind::Fallback,
        }
    }
}

/// Picks the key sharing the longest substring with the input.
///
/// A key matches when either string contains the other; the matched length is
/// that of the shorter one. Equal lengths keep the earliest key in the table.
fn best_partial_match<'a>(entries: &'a [ChapterEntry], chapter_key: &str) -> Option<&'a ChapterEntry> {
    if chapter_key.trim().is_empty() {
        return None;
    }

    let mut best: Option<(&ChapterEntry, usize)> = None;
    for entry in entries {
        let matched = if chapter_key.contains(entry.key.as_str()) {
            entry.key.len()
        } else if entry.key.contains(chapter_key) {
            chapter_key.len()
        } else {
            continue;
        };
        if best.is_none_or(|(_, len)| matched > len) {
            best = Some((entry, matched));
        }
    }
    best.map(|(entry, _)| entry)
}

/// Lowercase, trim, and collapse runs of whitespace to a single space.
#[must_use]
pub fn normalize_subject(subject: &str) -> String {
    subject
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Generic study material for chapters the table does not know.
#[must_use]
pub fn fallback_content(subject: &str, chapter: &str) -> ChapterContent {
    let search: String = url::form_urlencoded::byte_serialize(chapter.as_bytes()).collect();
    ChapterContent {
        name: chapter.to_owned(),
        notes: format!(
            "Study the concepts and principles covered in \"{chapter}\" for {subject}. \
             Review all definitions, formulas, and key theories."
        ),
        key_points: [
            "Review all definitions and terminology",
            "Study examples and practice problems",
            "Understand core concepts and theories",
            "Make connections between topics",
            "Practice problems and self-assessment",
        ]
        .into_iter()
        .map(str::to_owned)
        .collect(),
        resources: vec![
            Resource::new(format!("Khan Academy - {subject}"), "https://www.khanacademy.org"),
            Resource::new(
                format!("Wikipedia - {chapter}"),
                format!("https://en.wikipedia.org/w/index.php?search={search}"),
            ),
            Resource::new("Coursera - Free Courses", "https://www.coursera.org"),
        ],
    }
}
