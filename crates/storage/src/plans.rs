use std::sync::Arc;

use tokio::sync::Mutex;

use planner_core::model::{PlanId, PlanSummary, StudyPlan};

use crate::repository::{KeyValueStore, StorageError};

/// Key holding the JSON list of plan summaries.
pub const PLAN_INDEX_KEY: &str = "studyPlans";

/// Persists plans as JSON blobs under `plan-<id>`, plus a summary index.
///
/// Clones share one write lock, so every read-modify-write of a blob or of the
/// index runs alone within the process.
#[derive(Clone)]
pub struct PlanStore {
    kv: Arc<dyn KeyValueStore>,
    writes: Arc<Mutex<()>>,
}

impl PlanStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            writes: Arc::new(Mutex::new(())),
        }
    }

    /// Write a plan and add or refresh its index entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if serialization or the backend fails.
    pub async fn save(&self, id: PlanId, plan: &StudyPlan) -> Result<(), StorageError> {
        let _guard = self.writes.lock().await;
        let blob = serde_json::to_string(plan)?;
        self.kv.set(&id.storage_key(), &blob).await?;

        let mut index = self.list().await?;
        let summary = PlanSummary::from_plan(id, plan);
        match index.iter_mut().find(|entry| entry.id == id) {
            Some(existing) => *existing = summary,
            None => index.push(summary),
        }
        self.write_index(&index).await
    }

    /// Load a plan, apply `change` and store the result, holding the write
    /// lock throughout. Nothing is written when `change` fails.
    ///
    /// # Errors
    ///
    /// Returns the error of `change`, or a `StorageError` (`NotFound` for an
    /// unknown id) converted into `E`.
    pub async fn modify<T, E, F>(&self, id: PlanId, change: F) -> Result<T, E>
    where
        F: FnOnce(&mut StudyPlan) -> Result<T, E>,
        E: From<StorageError>,
    {
        let _guard = self.writes.lock().await;
        let mut plan = self.load(id).await?;
        let output = change(&mut plan)?;
        self.replace_blob(id, &plan).await?;
        Ok(output)
    }

    /// Load a full plan.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or `Serialization` for a
    /// corrupt blob.
    pub async fn load(&self, id: PlanId) -> Result<StudyPlan, StorageError> {
        let blob = self
            .kv
            .get(&id.storage_key())
            .await?
            .ok_or(StorageError::NotFound)?;
        Ok(serde_json::from_str(&blob)?)
    }

    /// Summaries in creation order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the index cannot be read or decoded.
    pub async fn list(&self) -> Result<Vec<PlanSummary>, StorageError> {
        match self.kv.get(PLAN_INDEX_KEY).await? {
            Some(blob) => Ok(serde_json::from_str(&blob)?),
            None => Ok(Vec::new()),
        }
    }

    /// Remove a plan and its index entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if neither blob nor index entry exist.
    pub async fn delete(&self, id: PlanId) -> Result<(), StorageError> {
        let _guard = self.writes.lock().await;
        let had_blob = self.kv.delete(&id.storage_key()).await?;

        let mut index = self.list().await?;
        let before = index.len();
        index.retain(|entry| entry.id != id);
        let had_entry = index.len() != before;
        if had_entry {
            self.write_index(&index).await?;
        }

        if had_blob || had_entry {
            Ok(())
        } else {
            Err(StorageError::NotFound)
        }
    }

    async fn replace_blob(&self, id: PlanId, plan: &StudyPlan) -> Result<(), StorageError> {
        let key = id.storage_key();
        if self.kv.get(&key).await?.is_none() {
            return Err(StorageError::NotFound);
        }
        let blob = serde_json::to_string(plan)?;
        self.kv.set(&key, &blob).await
    }

    async fn write_index(&self, index: &[PlanSummary]) -> Result<(), StorageError> {
        let blob = serde_json::to_string(index)?;
        self.kv.set(PLAN_INDEX_KEY, &blob).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryStore;
    use planner_core::model::{ChapterContent, Phase};
    use planner_core::time::fixed_now;

    fn build_plan(subject: &str) -> StudyPlan {
        let today = fixed_now().date_naive();
        let phase = Phase {
            start_day: 1,
            end_day: 3,
            start_date: today,
            end_date: today + chrono::Duration::days(2),
            chapters: vec![ChapterContent::placeholder("Chapter 1")],
            completed: false,
        };
        StudyPlan::new(subject, today + chrono::Duration::days(3), 3, vec![phase], fixed_now())
    }

    #[tokio::test]
    async fn save_load_and_list() {
        let kv = InMemoryStore::new();
        let store = PlanStore::new(Arc::new(kv.clone()));
        let id = PlanId::generate();
        let plan = build_plan("AP Chemistry");

        store.save(id, &plan).await.unwrap();

        assert_eq!(store.load(id).await.unwrap(), plan);
        let index = store.list().await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].id, id);
        assert_eq!(index[0].chapters, vec!["Chapter 1"]);
        assert!(kv.get(&format!("plan-{id}")).await.unwrap().is_some());
        assert!(kv.get(PLAN_INDEX_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn saving_twice_keeps_one_index_entry() {
        let store = PlanStore::new(Arc::new(InMemoryStore::new()));
        let id = PlanId::generate();
        store.save(id, &build_plan("A")).await.unwrap();
        store.save(id, &build_plan("B")).await.unwrap();

        let index = store.list().await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].subject, "B");
    }

    #[tokio::test]
    async fn list_preserves_creation_order() {
        let store = PlanStore::new(Arc::new(InMemoryStore::new()));
        let ids: Vec<_> = (0..3).map(|_| PlanId::generate()).collect();
        for (i, id) in ids.iter().enumerate() {
            store.save(*id, &build_plan(&format!("S{i}"))).await.unwrap();
        }
        let listed: Vec<_> = store.list().await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn delete_removes_blob_and_index_entry() {
        let store = PlanStore::new(Arc::new(InMemoryStore::new()));
        let keep = PlanId::generate();
        let drop_id = PlanId::generate();
        store.save(keep, &build_plan("Keep")).await.unwrap();
        store.save(drop_id, &build_plan("Drop")).await.unwrap();

        store.delete(drop_id).await.unwrap();

        assert!(matches!(store.load(drop_id).await, Err(StorageError::NotFound)));
        let index = store.list().await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].id, keep);
        assert!(matches!(store.delete(drop_id).await, Err(StorageError::NotFound)));
    }

    #[tokio::test]
    async fn modify_writes_only_on_success() {
        let store = PlanStore::new(Arc::new(InMemoryStore::new()));
        let id = PlanId::generate();
        store.save(id, &build_plan("AP Physics 1")).await.unwrap();

        let completed = store
            .modify(id, |plan| plan.toggle_phase(0).map_err(|_| StorageError::NotFound))
            .await
            .unwrap();
        assert!(completed);
        assert!(store.load(id).await.unwrap().schedule()[0].completed);

        let failed: Result<bool, StorageError> = store
            .modify(id, |plan| {
                plan.toggle_phase(0).ok();
                Err(StorageError::Conflict)
            })
            .await;
        assert!(matches!(failed, Err(StorageError::Conflict)));
        assert!(store.load(id).await.unwrap().schedule()[0].completed);

        let missing: Result<(), StorageError> =
            store.modify(PlanId::generate(), |_| Ok(())).await;
        assert!(matches!(missing, Err(StorageError::NotFound)));
        assert!(store.list().await.unwrap().iter().all(|entry| entry.subject == "AP Physics 1"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_saves_all_reach_the_index() {
        let store = PlanStore::new(Arc::new(InMemoryStore::new()));
        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..64 {
            let store = store.clone();
            tasks.spawn(async move {
                let id = PlanId::generate();
                store.save(id, &build_plan(&format!("S{i}"))).await.unwrap();
                id
            });
        }
        let mut ids = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            ids.push(joined.unwrap());
        }

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 64);
        assert!(ids.iter().all(|id| listed.iter().any(|entry| entry.id == *id)));
    }

    #[tokio::test]
    async fn corrupt_blob_is_a_serialization_error() {
        let kv = InMemoryStore::new();
        let store = PlanStore::new(Arc::new(kv.clone()));
        let id = PlanId::generate();
        kv.set(&id.storage_key(), "{not json").await.unwrap();
        assert!(matches!(store.load(id).await, Err(StorageError::Serialization(_))));
    }
}
