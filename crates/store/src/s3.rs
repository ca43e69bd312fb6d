//! Remote object-store backend (spec §4.C variant 3): one JSON object per
//! job at `{prefix}/{id}.json`.
//!
//! `AmazonS3Builder` wiring is carried over from the teacher's
//! `S3Backend::new` (region/key/secret/session-token/endpoint-url
//! handling), generalized from segment storage to one-object-per-job.

use async_trait::async_trait;
use bytes::Bytes;
use ecss_core::{AwsConfig, Job, JobPage, JobPatch, StoreError};
use futures::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::{path::Path as ObjectPath, ObjectStore};

use crate::backend::{JobStore, LOCK_JOB_ID};
use crate::retry::retry_once;

pub struct S3Store {
    store: Box<dyn ObjectStore>,
    prefix: String,
}

impl S3Store {
    pub fn connect(aws: &AwsConfig, bucket: &str, prefix: Option<&str>) -> Result<Self, StoreError> {
        let mut builder = AmazonS3Builder::new().with_region(&aws.region);

        if let Some(key) = &aws.access_key_id {
            builder = builder.with_access_key_id(key);
        }
        if let Some(secret) = &aws.secret_access_key {
            builder = builder.with_secret_access_key(secret);
        }
        if let Some(token) = &aws.session_token {
            builder = builder.with_token(token);
        }

        if let Some(endpoint) = &aws.endpoint_url {
            if !endpoint.is_empty() {
                let endpoint_url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
                    endpoint.clone()
                } else {
                    format!("https://{endpoint}")
                };
                builder = builder
                    .with_bucket_name(bucket)
                    .with_endpoint(&endpoint_url)
                    .with_allow_http(endpoint_url.starts_with("http://"));
            }
        } else {
            builder = builder.with_url(format!("s3://{bucket}"));
        }

        let store = builder.build().map_err(|e| StoreError::BackendUnavailable(e.to_string()))?;

        Ok(Self {
            store: Box::new(store),
            prefix: prefix.unwrap_or("").trim_end_matches('/').to_string(),
        })
    }

    fn object_path(&self, id: &str) -> ObjectPath {
        if self.prefix.is_empty() {
            ObjectPath::from(format!("{id}.json"))
        } else {
            ObjectPath::from(format!("{}/{id}.json", self.prefix))
        }
    }

    fn decode(id: &str, body: &[u8]) -> Result<Job, StoreError> {
        serde_json::from_slice(body).map_err(|e| StoreError::BackendCorrupt(id.to_string(), e.to_string()))
    }
}

#[async_trait]
impl JobStore for S3Store {
    async fn bootstrap(&self) -> Result<(), StoreError> {
        // Object stores have no meaningful "create bucket" step for a
        // scheduler daemon to take, unlike a local filesystem directory —
        // only check reachability.
        let scan_prefix = if self.prefix.is_empty() { None } else { Some(ObjectPath::from(self.prefix.clone())) };
        retry_once(|| async {
            self.store
                .list(scan_prefix.as_ref())
                .next()
                .await
                .transpose()
                .map_err(|e| StoreError::BackendUnavailable(e.to_string()))
        })
        .await?;
        Ok(())
    }

    async fn list(&self, skip: usize, limit: usize) -> Result<JobPage, StoreError> {
        let scan_prefix = if self.prefix.is_empty() { None } else { Some(ObjectPath::from(self.prefix.clone())) };
        let mut ids = retry_once(|| async {
            let mut stream = self.store.list(scan_prefix.as_ref());
            let mut ids = Vec::new();
            while let Some(meta) = stream.next().await {
                let meta = meta.map_err(|e| StoreError::BackendUnavailable(e.to_string()))?;
                if let Some(file_name) = meta.location.filename() {
                    if let Some(id) = file_name.strip_suffix(".json") {
                        ids.push(id.to_string());
                    }
                }
            }
            Ok(ids)
        })
        .await?;

        ids.retain(|id| id != LOCK_JOB_ID);
        ids.sort();
        let total = ids.len();

        let mut items = Vec::new();
        for id in ids.into_iter().skip(skip).take(limit) {
            items.push(self.get(&id).await?);
        }

        Ok(JobPage { items, total })
    }

    async fn get(&self, id: &str) -> Result<Job, StoreError> {
        let bytes = retry_once(|| async {
            let result = self.store.get(&self.object_path(id)).await.map_err(|e| match e {
                object_store::Error::NotFound { .. } => StoreError::NotFound(id.to_string()),
                other => StoreError::BackendUnavailable(other.to_string()),
            })?;
            result.bytes().await.map_err(|e| StoreError::BackendUnavailable(e.to_string()))
        })
        .await?;
        Self::decode(id, &bytes)
    }

    async fn create(&self, job: Job) -> Result<Job, StoreError> {
        if self.get(&job.id).await.is_ok() {
            return Err(StoreError::AlreadyExists(job.id.clone()));
        }
        let body = Bytes::from(serde_json::to_vec(&job)?);
        retry_once(|| async {
            self.store
                .put(&self.object_path(&job.id), body.clone().into())
                .await
                .map_err(|e| StoreError::BackendUnavailable(e.to_string()))
        })
        .await?;
        Ok(job)
    }

    async fn update(&self, id: &str, patch: JobPatch) -> Result<Job, StoreError> {
        let existing = self.get(id).await?;
        let merged = patch.merge_onto(existing);
        let body = Bytes::from(serde_json::to_vec(&merged)?);
        retry_once(|| async {
            self.store
                .put(&self.object_path(id), body.clone().into())
                .await
                .map_err(|e| StoreError::BackendUnavailable(e.to_string()))
        })
        .await?;
        Ok(merged)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        retry_once(|| async {
            self.store.delete(&self.object_path(id)).await.map_err(|e| match e {
                object_store::Error::NotFound { .. } => StoreError::NotFound(id.to_string()),
                other => StoreError::BackendUnavailable(other.to_string()),
            })
        })
        .await
    }
}
