//! Remote search-index backend (spec §4.C variant 5): one document per
//! job keyed by `id`, against the Elasticsearch/OpenSearch REST document
//! API.
//!
//! Uses `reqwest` the same un-opinionated way the teacher's notification
//! path uses it for webhook delivery — no dedicated client SDK.

use async_trait::async_trait;
use ecss_core::{Job, JobPage, JobPatch, StoreError};
use reqwest::{Client, StatusCode};
use serde_json::json;

use crate::backend::{JobStore, LOCK_JOB_ID};
use crate::retry::retry_once;

pub struct OpenSearchStore {
    client: Client,
    base_url: String,
    index: String,
}

impl OpenSearchStore {
    pub fn connect(hosts: &[String], index: &str) -> Result<Self, StoreError> {
        let base_url = hosts
            .first()
            .cloned()
            .ok_or_else(|| StoreError::BackendUnavailable("no ELASTICSEARCH_HOSTS configured".to_string()))?;
        Ok(Self { client: Client::new(), base_url: base_url.trim_end_matches('/').to_string(), index: index.to_string() })
    }

    fn doc_url(&self, id: &str) -> String {
        format!("{}/{}/_doc/{}", self.base_url, self.index, id)
    }
}

#[async_trait]
impl JobStore for OpenSearchStore {
    async fn bootstrap(&self) -> Result<(), StoreError> {
        retry_once(|| async {
            let resp = self
                .client
                .put(format!("{}/{}", self.base_url, self.index))
                .send()
                .await
                .map_err(|e| StoreError::BackendUnavailable(e.to_string()))?;
            // index-already-exists is not an error ("ignore=400" semantics).
            if resp.status().is_success() || resp.status() == StatusCode::BAD_REQUEST {
                Ok(())
            } else {
                Err(StoreError::BackendUnavailable(format!("index bootstrap failed: {}", resp.status())))
            }
        })
        .await
    }

    async fn list(&self, skip: usize, limit: usize) -> Result<JobPage, StoreError> {
        let body = json!({
            "from": skip,
            "size": limit,
            "sort": [{ "id.keyword": "asc" }],
            "query": { "bool": { "must": { "match_all": {} }, "must_not": { "term": { "id.keyword": LOCK_JOB_ID } } } },
        });
        let parsed: serde_json::Value = retry_once(|| async {
            let resp = self
                .client
                .post(format!("{}/{}/_search", self.base_url, self.index))
                .json(&body)
                .send()
                .await
                .map_err(|e| StoreError::BackendUnavailable(e.to_string()))?
                .error_for_status()
                .map_err(|e| StoreError::BackendUnavailable(e.to_string()))?;
            resp.json().await.map_err(|e| StoreError::BackendUnavailable(e.to_string()))
        })
        .await?;

        let total = parsed["hits"]["total"]["value"].as_u64().unwrap_or(0) as usize;
        let hits = parsed["hits"]["hits"].as_array().cloned().unwrap_or_default();

        let mut items = Vec::with_capacity(hits.len());
        for hit in hits {
            let id = hit["_id"].as_str().unwrap_or_default().to_string();
            let job: Job = serde_json::from_value(hit["_source"].clone())
                .map_err(|e| StoreError::BackendCorrupt(id, e.to_string()))?;
            items.push(job);
        }

        Ok(JobPage { items, total })
    }

    async fn get(&self, id: &str) -> Result<Job, StoreError> {
        retry_once(|| async {
            let resp = self.client.get(self.doc_url(id)).send().await.map_err(|e| StoreError::BackendUnavailable(e.to_string()))?;
            if resp.status() == StatusCode::NOT_FOUND {
                return Err(StoreError::NotFound(id.to_string()));
            }
            let parsed: serde_json::Value = resp
                .error_for_status()
                .map_err(|e| StoreError::BackendUnavailable(e.to_string()))?
                .json()
                .await
                .map_err(|e| StoreError::BackendUnavailable(e.to_string()))?;
            serde_json::from_value(parsed["_source"].clone()).map_err(|e| StoreError::BackendCorrupt(id.to_string(), e.to_string()))
        })
        .await
    }

    async fn create(&self, job: Job) -> Result<Job, StoreError> {
        retry_once(|| async {
            let resp = self
                .client
                .put(format!("{}?op_type=create", self.doc_url(&job.id)))
                .json(&job)
                .send()
                .await
                .map_err(|e| StoreError::BackendUnavailable(e.to_string()))?;
            if resp.status() == StatusCode::CONFLICT {
                return Err(StoreError::AlreadyExists(job.id.clone()));
            }
            resp.error_for_status().map_err(|e| StoreError::BackendUnavailable(e.to_string()))?;
            Ok(())
        })
        .await?;
        Ok(job)
    }

    async fn update(&self, id: &str, patch: JobPatch) -> Result<Job, StoreError> {
        let existing = self.get(id).await?;
        let merged = patch.merge_onto(existing);
        retry_once(|| async {
            self.client
                .put(self.doc_url(id))
                .json(&merged)
                .send()
                .await
                .map_err(|e| StoreError::BackendUnavailable(e.to_string()))?
                .error_for_status()
                .map_err(|e| StoreError::BackendUnavailable(e.to_string()))?;
            Ok(())
        })
        .await?;
        Ok(merged)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        retry_once(|| async {
            let resp = self
                .client
                .delete(self.doc_url(id))
                .send()
                .await
                .map_err(|e| StoreError::BackendUnavailable(e.to_string()))?;
            if resp.status() == StatusCode::NOT_FOUND {
                return Err(StoreError::NotFound(id.to_string()));
            }
            resp.error_for_status().map_err(|e| StoreError::BackendUnavailable(e.to_string()))?;
            Ok(())
        })
        .await
    }
}
