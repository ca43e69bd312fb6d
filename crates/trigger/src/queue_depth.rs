//! Built-in queue-depth trigger (spec §4.D), wire type tag `"sqs"`.

use async_trait::async_trait;
use aws_sdk_sqs::config::BehaviorVersion;
use aws_sdk_sqs::types::QueueAttributeName;
use aws_sdk_sqs::Client;
use ecss_core::AwsConfig;

use crate::error::TriggerError;
use crate::evaluator::TriggerEvaluator;

/// Probes current approximate queue depth. Kept separate from the
/// evaluator so tests can inject a fake depth without live AWS
/// credentials.
#[async_trait]
pub trait QueueDepthProbe: Send + Sync {
    async fn approximate_depth(&self, queue_name: &str) -> Result<u64, TriggerError>;
}

/// Grounded directly on the teacher's `SqsConsumer::health_check` /
/// `dlq_depth`, which already call `GetQueueAttributes` /
/// `ApproximateNumberOfMessages` — reused verbatim as the depth source.
pub struct SqsDepthProbe {
    client: Client,
}

impl SqsDepthProbe {
    pub fn new(aws: &AwsConfig) -> Self {
        let region = aws_sdk_sqs::config::Region::new(aws.region.clone());
        let mut config = aws_sdk_sqs::Config::builder().region(region).behavior_version(BehaviorVersion::latest());

        if let (Some(key_id), Some(secret)) = (&aws.access_key_id, &aws.secret_access_key) {
            let creds = aws_credential_types::Credentials::new(key_id, secret, aws.session_token.clone(), None, "ecss-trigger-static");
            config = config.credentials_provider(creds);
        }
        if let Some(endpoint) = &aws.endpoint_url {
            if !endpoint.is_empty() {
                config = config.endpoint_url(endpoint.clone());
            }
        }

        Self { client: Client::from_conf(config.build()) }
    }
}

#[async_trait]
impl QueueDepthProbe for SqsDepthProbe {
    async fn approximate_depth(&self, queue_name: &str) -> Result<u64, TriggerError> {
        let queue_url = self
            .client
            .get_queue_url()
            .queue_name(queue_name)
            .send()
            .await
            .map_err(|e| TriggerError::ProbeFailed(format!("resolve queue url for {queue_name:?}: {e}")))?
            .queue_url
            .ok_or_else(|| TriggerError::ProbeFailed(format!("no queue url returned for {queue_name:?}")))?;

        let resp = self
            .client
            .get_queue_attributes()
            .queue_url(&queue_url)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessages)
            .send()
            .await
            .map_err(|e| TriggerError::ProbeFailed(format!("GetQueueAttributes failed: {e}")))?;

        let count = resp
            .attributes()
            .and_then(|attrs| attrs.get(&QueueAttributeName::ApproximateNumberOfMessages))
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        Ok(count)
    }
}

/// Fields: `queueName` (required), `messagesPerTask` (>= 1). Validated
/// up front by `ecss_core::validate`; this evaluator still defends
/// against malformed specs reaching it directly (e.g. a dry-run call
/// bypassing the store's validated record).
pub struct QueueDepthTrigger {
    probe: std::sync::Arc<dyn QueueDepthProbe>,
}

impl QueueDepthTrigger {
    pub fn new(probe: std::sync::Arc<dyn QueueDepthProbe>) -> Self {
        Self { probe }
    }
}

#[async_trait]
impl TriggerEvaluator for QueueDepthTrigger {
    async fn desired_count(&self, fields: &serde_json::Map<String, serde_json::Value>) -> Result<u32, TriggerError> {
        let queue_name = fields
            .get("queueName")
            .and_then(|v| v.as_str())
            .ok_or_else(|| TriggerError::MalformedSpec("sqs".to_string(), "missing queueName".to_string()))?;
        let messages_per_task = fields
            .get("messagesPerTask")
            .and_then(|v| v.as_u64())
            .filter(|n| *n >= 1)
            .ok_or_else(|| TriggerError::MalformedSpec("sqs".to_string(), "missing or invalid messagesPerTask".to_string()))?;

        let depth = self.probe.approximate_depth(queue_name).await?;
        if depth == 0 {
            return Ok(0);
        }
        Ok(depth.div_ceil(messages_per_task) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeProbe(u64);

    #[async_trait]
    impl QueueDepthProbe for FakeProbe {
        async fn approximate_depth(&self, _queue_name: &str) -> Result<u64, TriggerError> {
            Ok(self.0)
        }
    }

    fn fields(messages_per_task: u64) -> serde_json::Map<String, serde_json::Value> {
        serde_json::json!({ "queueName": "q", "messagesPerTask": messages_per_task })
            .as_object()
            .unwrap()
            .clone()
    }

    #[tokio::test]
    async fn zero_depth_means_zero_desired() {
        let trigger = QueueDepthTrigger::new(std::sync::Arc::new(FakeProbe(0)));
        assert_eq!(trigger.desired_count(&fields(100)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn depth_rounds_up_to_task_count() {
        let trigger = QueueDepthTrigger::new(std::sync::Arc::new(FakeProbe(250)));
        assert_eq!(trigger.desired_count(&fields(100)).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn missing_queue_name_is_malformed() {
        let trigger = QueueDepthTrigger::new(std::sync::Arc::new(FakeProbe(10)));
        let fields = serde_json::json!({ "messagesPerTask": 10 }).as_object().unwrap().clone();
        let err = trigger.desired_count(&fields).await.unwrap_err();
        assert!(matches!(err, TriggerError::MalformedSpec(_, _)));
    }
}
