//! Single-process advisory lock (design note "Single-process
//! constraint"): "encode the scheduler's single-writer assumption as an
//! advisory lock or startup log, not silently; ... must fail loudly or
//! refuse to start the scheduler loop."
//!
//! Implemented on the same [`JobStore`] every job uses, rather than a
//! backend-specific mechanism, so every store variant gets the same
//! guarantee for free: a sentinel record at [`LOCK_JOB_ID`] holds the
//! holder tag in `taskDefinition` and a heartbeat in `lastRun`.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use ecss_core::{Job, JobPatch, StoreError};
use ecss_store::JobStore;
use thiserror::Error;

/// Reserved job id for the lock record; never scheduled (see
/// `SchedulerEngine::insert`) and excluded from every backend's `list`.
/// Defined in `ecss-store` (the lowest crate that needs to filter it
/// out of listings) and re-exported here so the rest of the scheduler
/// keeps importing it from this module.
pub use ecss_store::LOCK_JOB_ID;

/// A heartbeat older than this is presumed to belong to a crashed
/// process rather than a live one.
const STALE_AFTER_SECS: i64 = 60;

#[derive(Error, Debug)]
pub enum LockError {
    #[error("scheduler lock already held by '{holder}' (heartbeat at {heartbeat})")]
    AlreadyHeld { holder: String, heartbeat: DateTime<Utc> },
    #[error("store error while handling scheduler lock: {0}")]
    Store(#[from] StoreError),
}

pub struct AdvisoryLock {
    store: Arc<dyn JobStore>,
    holder: String,
}

impl AdvisoryLock {
    pub fn new(store: Arc<dyn JobStore>, holder: impl Into<String>) -> Self {
        Self { store, holder: holder.into() }
    }

    /// Acquire the lock or fail loudly. Does not silently steal a live
    /// holder's lock; a stale (older than [`STALE_AFTER_SECS`]) heartbeat
    /// is taken over with a warning.
    pub async fn acquire(&self) -> Result<(), LockError> {
        match self.store.get(LOCK_JOB_ID).await {
            Ok(existing) => {
                let heartbeat = existing.last_run.unwrap_or(DateTime::<Utc>::MIN_UTC);
                let age = Utc::now().signed_duration_since(heartbeat);
                if age < Duration::seconds(STALE_AFTER_SECS) {
                    tracing::error!(
                        holder = %existing.task_definition,
                        heartbeat = %heartbeat,
                        "refusing to start: scheduler lock is held by another live process"
                    );
                    return Err(LockError::AlreadyHeld { holder: existing.task_definition, heartbeat });
                }
                tracing::warn!(previous_holder = %existing.task_definition, heartbeat = %heartbeat, "stale scheduler lock, taking over");
                self.heartbeat().await?;
            }
            Err(StoreError::NotFound(_)) => {
                self.store.create(lock_record(&self.holder)).await?;
            }
            Err(err) => return Err(err.into()),
        }

        tracing::info!(holder = %self.holder, "scheduler lock acquired");
        Ok(())
    }

    /// Bump the heartbeat. Call this periodically from the tick loop so
    /// a live process's lock never looks stale to another would-be
    /// holder.
    pub async fn heartbeat(&self) -> Result<(), LockError> {
        let patch = JobPatch { task_definition: Some(self.holder.clone()), last_run: Some(Utc::now()), ..Default::default() };
        self.store.update(LOCK_JOB_ID, patch).await?;
        Ok(())
    }
}

fn lock_record(holder: &str) -> Job {
    Job {
        id: LOCK_JOB_ID.to_string(),
        task_definition: holder.to_string(),
        schedule: "0 0 0 * * * 1 *".to_string(),
        schedule_start: None,
        schedule_end: None,
        timezone: "UTC".to_string(),
        task_count: 1,
        max_count: None,
        trigger: None,
        suspended: true,
        overrides: Vec::new(),
        last_run: Some(Utc::now()),
        last_run_tasks: Vec::new(),
        estimated_next_run: None,
    }
}

#[cfg(test)]
mod tests {
    use ecss_store::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn second_holder_is_refused_while_heartbeat_is_fresh() {
        let store: Arc<dyn JobStore> = Arc::new(MemoryStore::new());
        let first = AdvisoryLock::new(store.clone(), "proc-a");
        first.acquire().await.unwrap();

        let second = AdvisoryLock::new(store.clone(), "proc-b");
        let err = second.acquire().await.unwrap_err();
        assert!(matches!(err, LockError::AlreadyHeld { .. }));
    }

    #[tokio::test]
    async fn stale_heartbeat_is_taken_over() {
        let store: Arc<dyn JobStore> = Arc::new(MemoryStore::new());
        let mut stale = lock_record("proc-a");
        stale.last_run = Some(Utc::now() - Duration::seconds(STALE_AFTER_SECS + 5));
        store.create(stale).await.unwrap();

        let second = AdvisoryLock::new(store.clone(), "proc-b");
        second.acquire().await.unwrap();
        let record = store.get(LOCK_JOB_ID).await.unwrap();
        assert_eq!(record.task_definition, "proc-b");
    }
}
