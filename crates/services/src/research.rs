//! Chapter research: turning chapter tokens into study content.
//!
//! Two backends exist. `LocalResearch` resolves against the in-process
//! content table; `HttpResearchClient` calls a remote research endpoint with
//! the same request and response shapes the HTTP service exposes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use planner_core::content::{
    ContentResolver, ContentTable, ContentTableError, MatchKind, fallback_content,
};
use planner_core::model::ChapterContent;

use crate::error::ResearchError;

/// Body of a research request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub subject: String,
    pub chapters: Vec<String>,
}

/// Body of a research response: one entry per requested chapter, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchResponse {
    pub chapter_details: Vec<ChapterContent>,
}

/// Source of study content for a list of chapters.
#[async_trait]
pub trait ChapterResearch: Send + Sync {
    /// Fetch content for every chapter, returned in input order.
    ///
    /// # Errors
    ///
    /// Returns `ResearchError` when the whole lookup fails.
    async fn research(
        &self,
        subject: &str,
        chapters: &[String],
    ) -> Result<Vec<ChapterContent>, ResearchError>;
}

/// Research that degrades to placeholder content when the backend fails.
pub async fn research_or_placeholder(
    research: &dyn ChapterResearch,
    subject: &str,
    chapters: &[String],
) -> Vec<ChapterContent> {
    match research.research(subject, chapters).await {
        Ok(details) => details,
        Err(err) => {
            warn!(%subject, chapters = chapters.len(), error = %err, "chapter research failed, using placeholders");
            chapters
                .iter()
                .map(|name| ChapterContent::placeholder(name.as_str()))
                .collect()
        }
    }
}

//
// ─── LOCAL ─────────────────────────────────────────────────────────────────────
//

/// Resolves chapters against a content table, one task per chapter.
#[derive(Debug, Clone)]
pub struct LocalResearch {
    resolver: ContentResolver,
}

impl LocalResearch {
    #[must_use]
    pub fn new(table: Arc<ContentTable>) -> Self {
        Self {
            resolver: ContentResolver::new(table),
        }
    }

    /// Local research over the built-in table.
    ///
    /// # Errors
    ///
    /// Returns `ContentTableError` if the embedded table is malformed.
    pub fn builtin() -> Result<Self, ContentTableError> {
        Ok(Self::new(Arc::new(ContentTable::builtin()?)))
    }

    #[must_use]
    pub fn resolver(&self) -> &ContentResolver {
        &self.resolver
    }

    /// Resolve every chapter concurrently and reassemble in input order.
    ///
    /// A lookup task that dies yields fallback content for its chapter only.
    pub async fn resolve_all(&self, subject: &str, chapters: &[String]) -> Vec<ChapterContent> {
        let mut tasks = JoinSet::new();
        for (index, chapter) in chapters.iter().cloned().enumerate() {
            let resolver = self.resolver.clone();
            let subject = subject.to_owned();
            tasks.spawn(async move { (index, resolver.resolve_with_kind(&subject, &chapter)) });
        }

        let mut slots: Vec<Option<ChapterContent>> = vec![None; chapters.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, resolution)) => {
                    match &resolution.kind {
                        MatchKind::Exact => debug!(chapter = %resolution.content.name, "exact content match"),
                        MatchKind::Partial { key } => {
                            debug!(chapter = %resolution.content.name, %key, "partial content match");
                        }
                        MatchKind::Fallback => debug!(chapter = %resolution.content.name, "generic content"),
                    }
                    slots[index] = Some(resolution.content);
                }
                Err(err) => warn!(error = %err, "chapter lookup task failed"),
            }
        }

        slots
            .into_iter()
            .zip(chapters)
            .map(|(slot, chapter)| slot.unwrap_or_else(|| fallback_content(subject, chapter)))
            .collect()
    }
}

#[async_trait]
impl ChapterResearch for LocalResearch {
    async fn research(
        &self,
        subject: &str,
        chapters: &[String],
    ) -> Result<Vec<ChapterContent>, ResearchError> {
        Ok(self.resolve_all(subject, chapters).await)
    }
}

//
// ─── HTTP ──────────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct ResearchConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ResearchConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/api/research-course", self.base_url.trim_end_matches('/'))
    }
}

/// Calls a remote research endpoint. A single attempt is made per request.
#[derive(Clone)]
pub struct HttpResearchClient {
    client: Client,
    config: ResearchConfig,
}

impl HttpResearchClient {
    /// # Errors
    ///
    /// Returns `ResearchError::Http` if the HTTP client cannot be built.
    pub fn new(config: ResearchConfig) -> Result<Self, ResearchError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ChapterResearch for HttpResearchClient {
    async fn research(
        &self,
        subject: &str,
        chapters: &[String],
    ) -> Result<Vec<ChapterContent>, ResearchError> {
        let payload = ResearchRequest {
            subject: subject.to_owned(),
            chapters: chapters.to_vec(),
        };

        let response = self
            .client
            .post(self.config.endpoint())
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ResearchError::HttpStatus(response.status()));
        }

        let body: ResearchResponse = response.json().await?;
        if body.chapter_details.len() != chapters.len() {
            return Err(ResearchError::ChapterCountMismatch {
                expected: chapters.len(),
                actual: body.chapter_details.len(),
            });
        }
        Ok(body.chapter_details)
    }
}
