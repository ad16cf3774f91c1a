use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::resolver::normalize_subject;
use crate::model::{ChapterContent, Resource};

const BUILTIN_TABLE: &str = include_str!("../../data/content.json");

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentTableError {
    #[error("content table is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("subject name cannot be empty")]
    EmptySubject,
    #[error("chapter key cannot be empty (subject {subject:?})")]
    EmptyChapterKey { subject: String },
    #[error("subject {0:?} appears more than once")]
    DuplicateSubject(String),
    #[error("chapter {chapter:?} appears more than once in subject {subject:?}")]
    DuplicateChapter { subject: String, chapter: String },
}

/// Stored material for one `(subject, chapter)` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterEntry {
    pub key: String,
    pub notes: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl ChapterEntry {
    /// Copy of this entry labelled with the caller's chapter name.
    #[must_use]
    pub fn to_content(&self, name: &str) -> ChapterContent {
        ChapterContent {
            name: name.to_owned(),
            notes: self.notes.clone(),
            key_points: self.key_points.clone(),
            resources: self.resources.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectEntry {
    pub name: String,
    pub chapters: Vec<ChapterEntry>,
}

/// Immutable `(subject, chapter) -> content` lookup table.
///
/// Subjects and chapters keep the order of the source document; partial
/// matches that tie are resolved by that order. Keys are normalized on load
/// (subjects lowercased with collapsed whitespace, chapters lowercased).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTable {
    subjects: Vec<SubjectEntry>,
}

impl ContentTable {
    /// The table shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns `ContentTableError` if the embedded asset is malformed.
    pub fn builtin() -> Result<Self, ContentTableError> {
        Self::from_json(BUILTIN_TABLE)
    }

    /// Load a table from its JSON representation.
    ///
    /// # Errors
    ///
    /// Returns `ContentTableError` for invalid JSON, empty keys, or keys that
    /// collide after normalization.
    pub fn from_json(json: &str) -> Result<Self, ContentTableError> {
        let raw: ContentTable = serde_json::from_str(json)?;
        Self::from_subjects(raw.subjects)
    }

    /// Build a table from already-parsed entries, normalizing keys.
    ///
    /// # Errors
    ///
    /// Returns `ContentTableError` for empty or duplicate keys.
    pub fn from_subjects(subjects: Vec<SubjectEntry>) -> Result<Self, ContentTableError> {
        let mut seen_subjects = HashSet::new();
        let mut normalized = Vec::with_capacity(subjects.len());

        for mut subject in subjects {
            subject.name = normalize_subject(&subject.name);
            if subject.name.is_empty() {
                return Err(ContentTableError::EmptySubject);
            }
            if !seen_subjects.insert(subject.name.clone()) {
                return Err(ContentTableError::DuplicateSubject(subject.name));
            }

            let mut seen_chapters = HashSet::new();
            for chapter in &mut subject.chapters {
                chapter.key = chapter.key.to_lowercase();
                if chapter.key.is_empty() {
                    return Err(ContentTableError::EmptyChapterKey {
                        subject: subject.name.clone(),
                    });
                }
                if !seen_chapters.insert(chapter.key.clone()) {
                    return Err(ContentTableError::DuplicateChapter {
                        subject: subject.name.clone(),
                        chapter: chapter.key.clone(),
                    });
                }
            }
            normalized.push(subject);
        }

        Ok(Self {
            subjects: normalized,
        })
    }

    /// Chapters for a normalized subject key, in table order.
    #[must_use]
    pub fn subject(&self, key: &str) -> Option<&[ChapterEntry]> {
        self.subjects
            .iter()
            .find(|s| s.name == key)
            .map(|s| s.chapters.as_slice())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}
