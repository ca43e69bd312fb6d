//! Embedded-SQL backend (spec §4.C variant 2): single table, JSON body.
//!
//! Built on `sqlx::SqlitePool` the same pooling idiom `stupid-server`
//! already depends on `sqlx` for (there it's Postgres/pgvector; here it's
//! the `sqlite` feature of the same crate against a different engine).

use async_trait::async_trait;
use ecss_core::{Job, JobPage, JobPatch, StoreError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use crate::backend::{JobStore, LOCK_JOB_ID};
use crate::retry::retry_once;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(file_path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new().filename(file_path).create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::BackendUnavailable(e.to_string()))?;
        Ok(Self { pool })
    }

    async fn get_row(&self, id: &str) -> Result<Option<String>, StoreError> {
        let row = retry_once(|| async {
            sqlx::query("SELECT body FROM jobs WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::BackendUnavailable(e.to_string()))
        })
        .await?;
        row.map(|row| row.try_get::<String, _>("body").map_err(|e| StoreError::Internal(e.to_string()))).transpose()
    }

    fn decode(id: &str, body: &str) -> Result<Job, StoreError> {
        serde_json::from_str(body).map_err(|e| StoreError::BackendCorrupt(id.to_string(), e.to_string()))
    }
}

#[async_trait]
impl JobStore for SqliteStore {
    async fn bootstrap(&self) -> Result<(), StoreError> {
        // Never reshapes a pre-existing table (spec §4.C "Bootstrap").
        retry_once(|| async {
            sqlx::query("CREATE TABLE IF NOT EXISTS jobs (id TEXT PRIMARY KEY, body TEXT NOT NULL)")
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::BackendUnavailable(e.to_string()))
        })
        .await?;
        Ok(())
    }

    async fn list(&self, skip: usize, limit: usize) -> Result<JobPage, StoreError> {
        let total: i64 = retry_once(|| async {
            sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE id != ?")
                .bind(LOCK_JOB_ID)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| StoreError::BackendUnavailable(e.to_string()))
        })
        .await?;

        let rows = retry_once(|| async {
            sqlx::query("SELECT id, body FROM jobs WHERE id != ? ORDER BY id LIMIT ? OFFSET ?")
                .bind(LOCK_JOB_ID)
                .bind(limit as i64)
                .bind(skip as i64)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StoreError::BackendUnavailable(e.to_string()))
        })
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id").map_err(|e| StoreError::Internal(e.to_string()))?;
            let body: String = row.try_get("body").map_err(|e| StoreError::Internal(e.to_string()))?;
            items.push(Self::decode(&id, &body)?);
        }

        Ok(JobPage { items, total: total as usize })
    }

    async fn get(&self, id: &str) -> Result<Job, StoreError> {
        let body = self.get_row(id).await?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Self::decode(id, &body)
    }

    async fn create(&self, job: Job) -> Result<Job, StoreError> {
        if self.get_row(&job.id).await?.is_some() {
            return Err(StoreError::AlreadyExists(job.id.clone()));
        }
        let body = serde_json::to_string(&job)?;
        retry_once(|| async {
            sqlx::query("INSERT INTO jobs (id, body) VALUES (?, ?)")
                .bind(&job.id)
                .bind(&body)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::BackendUnavailable(e.to_string()))
        })
        .await?;
        Ok(job)
    }

    async fn update(&self, id: &str, patch: JobPatch) -> Result<Job, StoreError> {
        let existing = self.get(id).await?;
        let merged = patch.merge_onto(existing);
        let body = serde_json::to_string(&merged)?;
        retry_once(|| async {
            sqlx::query("UPDATE jobs SET body = ? WHERE id = ?")
                .bind(&body)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::BackendUnavailable(e.to_string()))
        })
        .await?;
        Ok(merged)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = retry_once(|| async {
            sqlx::query("DELETE FROM jobs WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::BackendUnavailable(e.to_string()))
        })
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
