use serde::{Deserialize, Serialize};

/// An external study link attached to a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    pub url: String,
}

impl Resource {
    #[must_use]
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Study material for a single chapter: notes, key points, and links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterContent {
    pub name: String,
    pub notes: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl ChapterContent {
    /// Content used when research for a chapter could not be fetched.
    #[must_use]
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            notes: "Study this chapter thoroughly.".to_owned(),
            key_points: Vec::new(),
            resources: Vec::new(),
        }
    }
}
