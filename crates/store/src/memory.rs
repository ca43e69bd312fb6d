//! Ephemeral in-memory backend (spec §4.C variant 1).

use std::collections::BTreeMap;

use async_trait::async_trait;
use ecss_core::{Job, JobPage, JobPatch, StoreError};
use tokio::sync::RwLock;

use crate::backend::{JobStore, LOCK_JOB_ID};

/// `BTreeMap` keyed by `id` gives the deterministic ordering `list`
/// requires without a separate sort step.
#[derive(Default)]
pub struct MemoryStore {
    jobs: RwLock<BTreeMap<String, Job>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn bootstrap(&self) -> Result<(), StoreError> {
        tracing::warn!("job store backend is in-memory — all jobs are lost on restart");
        Ok(())
    }

    async fn list(&self, skip: usize, limit: usize) -> Result<JobPage, StoreError> {
        let jobs = self.jobs.read().await;
        let total = jobs.len() - usize::from(jobs.contains_key(LOCK_JOB_ID));
        let items = jobs.values().filter(|j| j.id != LOCK_JOB_ID).skip(skip).take(limit).cloned().collect();
        Ok(JobPage { items, total })
    }

    async fn get(&self, id: &str) -> Result<Job, StoreError> {
        self.jobs.read().await.get(id).cloned().ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn create(&self, job: Job) -> Result<Job, StoreError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(StoreError::AlreadyExists(job.id.clone()));
        }
        jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    async fn update(&self, id: &str, patch: JobPatch) -> Result<Job, StoreError> {
        let mut jobs = self.jobs.write().await;
        let existing = jobs.get(id).cloned().ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let merged = patch.merge_onto(existing);
        jobs.insert(id.to_string(), merged.clone());
        Ok(merged)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.jobs.write().await.remove(id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: &str) -> Job {
        Job {
            id: id.to_string(),
            task_definition: "sleeper-task".to_string(),
            schedule: "25 */5".to_string(),
            schedule_start: None,
            schedule_end: None,
            timezone: "UTC".to_string(),
            task_count: 1,
            max_count: None,
            trigger: None,
            suspended: false,
            overrides: Vec::new(),
            last_run: None,
            last_run_tasks: Vec::new(),
            estimated_next_run: None,
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = MemoryStore::new();
        store.create(job("a")).await.unwrap();
        let got = store.get("a").await.unwrap();
        assert_eq!(got.id, "a");
    }

    #[tokio::test]
    async fn duplicate_create_fails() {
        let store = MemoryStore::new();
        store.create(job("a")).await.unwrap();
        let err = store.create(job("a")).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn list_is_ordered_by_id() {
        let store = MemoryStore::new();
        store.create(job("b")).await.unwrap();
        store.create(job("a")).await.unwrap();
        let page = store.list(0, 10).await.unwrap();
        assert_eq!(page.items.iter().map(|j| j.id.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn update_missing_fails_not_found() {
        let store = MemoryStore::new();
        let err = store.update("missing", JobPatch::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_excludes_the_lock_sentinel() {
        let store = MemoryStore::new();
        store.create(job("a")).await.unwrap();
        store.create(job(LOCK_JOB_ID)).await.unwrap();

        let page = store.list(0, 10).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items.iter().map(|j| j.id.as_str()).collect::<Vec<_>>(), vec!["a"]);
    }
}
