//! Canned study content and the lookup that resolves chapters against it.

mod resolver;
mod table;

pub use resolver::{ContentResolver, MatchKind, Resolution, fallback_content, normalize_subject};
pub use table::{ChapterEntry, ContentTable, ContentTableError, SubjectEntry};
