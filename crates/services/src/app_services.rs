use std::path::Path;
use std::sync::Arc;

use planner_core::content::ContentTable;
use storage::PlanStore;
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::plan_service::PlanService;
use crate::progress_service::ProgressService;
use crate::quiz_service::QuizService;
use crate::research::{ChapterResearch, HttpResearchClient, LocalResearch, ResearchConfig};

/// Where chapter content comes from.
#[derive(Debug, Clone, Default)]
pub enum ResearchSource {
    /// The content table compiled into the binary.
    #[default]
    Builtin,
    /// A content table JSON file loaded at startup.
    TableFile(String),
    /// A remote research endpoint.
    Remote(ResearchConfig),
}

impl ResearchSource {
    /// Build the research backend.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if a table cannot be read or parsed, or the
    /// HTTP client cannot be created.
    pub fn build(&self) -> Result<Arc<dyn ChapterResearch>, AppServicesError> {
        let research: Arc<dyn ChapterResearch> = match self {
            Self::Builtin => Arc::new(LocalResearch::builtin()?),
            Self::TableFile(path) => Arc::new(LocalResearch::new(Arc::new(load_table(path)?))),
            Self::Remote(config) => Arc::new(HttpResearchClient::new(config.clone())?),
        };
        Ok(research)
    }

    /// The local content table, when this source has one.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the table cannot be read or parsed.
    pub fn local_table(&self) -> Result<Option<ContentTable>, AppServicesError> {
        match self {
            Self::Builtin => Ok(Some(ContentTable::builtin()?)),
            Self::TableFile(path) => Ok(Some(load_table(path)?)),
            Self::Remote(_) => Ok(None),
        }
    }
}

fn load_table(path: &str) -> Result<ContentTable, AppServicesError> {
    let json = std::fs::read_to_string(Path::new(path)).map_err(|source| {
        AppServicesError::ContentFile {
            path: path.to_owned(),
            source,
        }
    })?;
    Ok(ContentTable::from_json(&json)?)
}

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    plans: Arc<PlanService>,
    progress: Arc<ProgressService>,
    quiz: Arc<QuizService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        research: Arc<dyn ChapterResearch>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, research))
    }

    /// Build services over an in-memory store.
    #[must_use]
    pub fn in_memory(clock: Clock, research: Arc<dyn ChapterResearch>) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, research)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, research: Arc<dyn ChapterResearch>) -> Self {
        let store = PlanStore::new(Arc::clone(&storage.kv));
        Self {
            plans: Arc::new(PlanService::new(clock, research, store.clone())),
            progress: Arc::new(ProgressService::new(store.clone())),
            quiz: Arc::new(QuizService::new(store)),
        }
    }

    #[must_use]
    pub fn plans(&self) -> Arc<PlanService> {
        Arc::clone(&self.plans)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizService> {
        Arc::clone(&self.quiz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_source_has_local_table() {
        let table = ResearchSource::Builtin.local_table().unwrap();
        assert!(table.is_some_and(|t| !t.is_empty()));
        assert!(
            ResearchSource::Remote(ResearchConfig::new("http://localhost"))
                .local_table()
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn missing_table_file_is_reported() {
        let err = ResearchSource::TableFile("/definitely/not/here.json".into())
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, AppServicesError::ContentFile { .. }));
    }
}
