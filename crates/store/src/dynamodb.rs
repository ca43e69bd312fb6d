//! Remote key-value backend (spec §4.C variant 4): one item per job,
//! partition key `id`, `body` attribute holding canonical JSON.
//!
//! Client construction mirrors the teacher's `SqsConsumer::new` —
//! explicit `aws_sdk_*::Config::builder()`, static credentials when
//! present, optional endpoint override for local DynamoDB.

use async_trait::async_trait;
use aws_sdk_dynamodb::config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::types::{AttributeValue, ScalarAttributeType};
use aws_sdk_dynamodb::Client;
use ecss_core::{AwsConfig, Job, JobPage, JobPatch, StoreError};

use crate::backend::{JobStore, LOCK_JOB_ID};
use crate::retry::retry_once;

pub struct DynamoDbStore {
    client: Client,
    table: String,
}

impl DynamoDbStore {
    pub fn connect(aws: &AwsConfig, table: &str) -> Result<Self, StoreError> {
        let region = Region::new(aws.region.clone());
        let mut config = aws_sdk_dynamodb::Config::builder().region(region).behavior_version(BehaviorVersion::latest());

        if let (Some(key_id), Some(secret)) = (&aws.access_key_id, &aws.secret_access_key) {
            let creds = aws_credential_types::Credentials::new(key_id, secret, aws.session_token.clone(), None, "ecss-store-static");
            config = config.credentials_provider(creds);
        }

        if let Some(endpoint) = &aws.endpoint_url {
            if !endpoint.is_empty() {
                config = config.endpoint_url(endpoint.clone());
            }
        }

        Ok(Self { client: Client::from_conf(config.build()), table: table.to_string() })
    }

    fn decode(id: &str, item: &std::collections::HashMap<String, AttributeValue>) -> Result<Job, StoreError> {
        let body = item
            .get("body")
            .and_then(|v| v.as_s().ok())
            .ok_or_else(|| StoreError::BackendCorrupt(id.to_string(), "missing body attribute".to_string()))?;
        serde_json::from_str(body).map_err(|e| StoreError::BackendCorrupt(id.to_string(), e.to_string()))
    }
}

#[async_trait]
impl JobStore for DynamoDbStore {
    async fn bootstrap(&self) -> Result<(), StoreError> {
        retry_once(|| async {
            self.client
                .create_table()
                .table_name(&self.table)
                .attribute_definitions(
                    aws_sdk_dynamodb::types::AttributeDefinition::builder()
                        .attribute_name("id")
                        .attribute_type(ScalarAttributeType::S)
                        .build()
                        .map_err(|e| StoreError::Internal(e.to_string()))?,
                )
                .key_schema(
                    aws_sdk_dynamodb::types::KeySchemaElement::builder()
                        .attribute_name("id")
                        .key_type(aws_sdk_dynamodb::types::KeyType::Hash)
                        .build()
                        .map_err(|e| StoreError::Internal(e.to_string()))?,
                )
                .billing_mode(aws_sdk_dynamodb::types::BillingMode::PayPerRequest)
                .send()
                .await
                .map(|_| ())
                .or_else(|e| {
                    // Pre-existing table is used as-is (spec §4.C "Bootstrap").
                    if e.as_service_error().is_some_and(|se| se.is_resource_in_use_exception()) {
                        Ok(())
                    } else {
                        Err(StoreError::BackendUnavailable(e.to_string()))
                    }
                })
        })
        .await
    }

    async fn list(&self, skip: usize, limit: usize) -> Result<JobPage, StoreError> {
        let resp = retry_once(|| async {
            self.client.scan().table_name(&self.table).send().await.map_err(|e| StoreError::BackendUnavailable(e.to_string()))
        })
        .await?;

        let mut jobs = Vec::new();
        for item in resp.items.clone().unwrap_or_default() {
            let id = item.get("id").and_then(|v| v.as_s().ok()).map(|s| s.to_string()).unwrap_or_default();
            if id == LOCK_JOB_ID {
                continue;
            }
            jobs.push(Self::decode(&id, &item)?);
        }
        jobs.sort_by(|a, b| a.id.cmp(&b.id));

        let total = jobs.len();
        let items = jobs.into_iter().skip(skip).take(limit).collect();
        Ok(JobPage { items, total })
    }

    async fn get(&self, id: &str) -> Result<Job, StoreError> {
        let resp = retry_once(|| async {
            self.client
                .get_item()
                .table_name(&self.table)
                .key("id", AttributeValue::S(id.to_string()))
                .send()
                .await
                .map_err(|e| StoreError::BackendUnavailable(e.to_string()))
        })
        .await?;

        let item = resp.item.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Self::decode(id, &item)
    }

    async fn create(&self, job: Job) -> Result<Job, StoreError> {
        let body = serde_json::to_string(&job)?;
        retry_once(|| async {
            self.client
                .put_item()
                .table_name(&self.table)
                .item("id", AttributeValue::S(job.id.clone()))
                .item("body", AttributeValue::S(body.clone()))
                .condition_expression("attribute_not_exists(id)")
                .send()
                .await
                .map_err(|e| {
                    if e.as_service_error().is_some_and(|se| se.is_conditional_check_failed_exception()) {
                        StoreError::AlreadyExists(job.id.clone())
                    } else {
                        StoreError::BackendUnavailable(e.to_string())
                    }
                })
        })
        .await?;
        Ok(job)
    }

    async fn update(&self, id: &str, patch: JobPatch) -> Result<Job, StoreError> {
        let existing = self.get(id).await?;
        let merged = patch.merge_onto(existing);
        let body = serde_json::to_string(&merged)?;
        retry_once(|| async {
            self.client
                .put_item()
                .table_name(&self.table)
                .item("id", AttributeValue::S(id.to_string()))
                .item("body", AttributeValue::S(body.clone()))
                .send()
                .await
                .map_err(|e| StoreError::BackendUnavailable(e.to_string()))
        })
        .await?;
        Ok(merged)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.get(id).await?;
        retry_once(|| async {
            self.client
                .delete_item()
                .table_name(&self.table)
                .key("id", AttributeValue::S(id.to_string()))
                .send()
                .await
                .map_err(|e| StoreError::BackendUnavailable(e.to_string()))
        })
        .await?;
        Ok(())
    }
}
