//! The `JobStore` contract every backend implements (spec §4.C).

use async_trait::async_trait;
use ecss_core::{Job, JobPage, JobPatch, StoreError};

/// Reserved job id for the scheduler's advisory-lock sentinel record
/// (`ecss_scheduler::lock::AdvisoryLock`). Lives here, not in
/// `ecss-scheduler`, so every backend's `list` can exclude it without
/// a dependency cycle; `ecss_scheduler::lock` re-exports it for its own
/// internal `get`/`update`/`create` calls against the same record.
pub const LOCK_JOB_ID: &str = "__scheduler_lock__";

/// Polymorphic job persistence. Every operation returns the error
/// taxonomy from spec §7; backends are responsible for mapping their own
/// failure modes (I/O, deserialize, network) onto it.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Create the backend's underlying artifact (file, bucket, table,
    /// index) with reasonable defaults if absent. Pre-existing artifacts
    /// are used as-is and never reshaped (spec §4.C "Bootstrap").
    async fn bootstrap(&self) -> Result<(), StoreError>;

    /// Deterministic `id`-ordered page.
    async fn list(&self, skip: usize, limit: usize) -> Result<JobPage, StoreError>;

    async fn get(&self, id: &str) -> Result<Job, StoreError>;

    /// Fails with [`StoreError::AlreadyExists`] if `job.id` is taken.
    async fn create(&self, job: Job) -> Result<Job, StoreError>;

    /// Field-wise merge of `patch` onto the stored job. Fails with
    /// [`StoreError::NotFound`] if `id` is absent.
    async fn update(&self, id: &str, patch: JobPatch) -> Result<Job, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}
