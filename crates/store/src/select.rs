//! Backend selection precedence (spec §4.C "Bootstrap").
//!
//! Selecting more than one backend via configuration is a caller error;
//! when it happens the precedence order `[sqlite, s3, dynamodb,
//! opensearch]` wins and the ambiguity is logged loudly rather than
//! silently resolved (design note "Single-process constraint" extends to
//! config ambiguity generally — an operator footgun must not pass
//! quietly).

use std::sync::Arc;

use ecss_core::{Config, StoreError};

use crate::backend::JobStore;
use crate::dynamodb::DynamoDbStore;
use crate::memory::MemoryStore;
use crate::opensearch::OpenSearchStore;
use crate::s3::S3Store;
use crate::sqlite::SqliteStore;

/// Build the configured backend, bootstrap it, and return it ready to
/// serve the store trait.
pub async fn select_backend(config: &Config) -> Result<Arc<dyn JobStore>, StoreError> {
    let configured = [
        config.store.sqlite_file.is_some(),
        config.store.s3_bucket.is_some(),
        config.store.dynamodb_table.is_some(),
        config.store.elasticsearch_index.is_some(),
    ]
    .iter()
    .filter(|b| **b)
    .count();

    if configured > 1 {
        tracing::warn!(
            "multiple job store backends configured at once; using precedence [sqlite, s3, dynamodb, opensearch]"
        );
    }

    let store: Arc<dyn JobStore> = if let Some(path) = &config.store.sqlite_file {
        Arc::new(SqliteStore::connect(path).await?)
    } else if let Some(bucket) = &config.store.s3_bucket {
        Arc::new(S3Store::connect(&config.aws, bucket, config.store.s3_prefix.as_deref())?)
    } else if let Some(table) = &config.store.dynamodb_table {
        Arc::new(DynamoDbStore::connect(&config.aws, table)?)
    } else if let Some(index) = &config.store.elasticsearch_index {
        Arc::new(OpenSearchStore::connect(&config.store.elasticsearch_host_list(), index)?)
    } else {
        Arc::new(MemoryStore::new())
    };

    store.bootstrap().await?;
    Ok(store)
}
