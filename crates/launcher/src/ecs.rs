//! ECS-backed launcher (spec §4.E).
//!
//! Chunking at the provider's per-call limit mirrors the teacher's
//! `SqsConsumer::poll_batch`'s `max_messages.min(10)` idiom; the
//! log-and-continue-past-a-failing-chunk behavior mirrors
//! `queue::process_batch`'s per-message ack/nack-with-logging loop.

use async_trait::async_trait;
use aws_sdk_ecs::config::BehaviorVersion;
use aws_sdk_ecs::types::{ContainerOverride, KeyValuePair, TaskOverride};
use aws_sdk_ecs::Client;
use ecss_core::{AwsConfig, JobOverride};

use crate::launcher::TaskLauncher;
use crate::outcome::LaunchOutcome;

/// The orchestrator's per-`RunTask`-call limit.
const MAX_TASKS_PER_CALL: u32 = 10;

pub struct EcsLauncher {
    client: Client,
    cluster: String,
}

impl EcsLauncher {
    pub fn new(aws: &AwsConfig, cluster: impl Into<String>) -> Self {
        let region = aws_sdk_ecs::config::Region::new(aws.region.clone());
        let mut config = aws_sdk_ecs::Config::builder().region(region).behavior_version(BehaviorVersion::latest());

        if let (Some(key_id), Some(secret)) = (&aws.access_key_id, &aws.secret_access_key) {
            let creds = aws_credential_types::Credentials::new(key_id, secret, aws.session_token.clone(), None, "ecss-launcher-static");
            config = config.credentials_provider(creds);
        }
        if let Some(endpoint) = &aws.endpoint_url {
            if !endpoint.is_empty() {
                config = config.endpoint_url(endpoint.clone());
            }
        }

        Self { client: Client::from_conf(config.build()), cluster: cluster.into() }
    }

    fn task_override(overrides: &[JobOverride]) -> Option<TaskOverride> {
        if overrides.is_empty() {
            return None;
        }
        let container_overrides = overrides
            .iter()
            .map(|o| {
                let env = o
                    .environment
                    .iter()
                    .map(|(k, v)| KeyValuePair::builder().name(k).value(v).build())
                    .collect::<Vec<_>>();
                ContainerOverride::builder().name(&o.container_name).set_environment(Some(env)).build()
            })
            .collect::<Vec<_>>();
        Some(TaskOverride::builder().set_container_overrides(Some(container_overrides)).build())
    }
}

#[async_trait]
impl TaskLauncher for EcsLauncher {
    async fn launch(&self, task_definition: &str, count: u32, overrides: &[JobOverride], started_by: &str) -> LaunchOutcome {
        let mut outcome = LaunchOutcome::default();
        let mut remaining = count;

        while remaining > 0 {
            let chunk = remaining.min(MAX_TASKS_PER_CALL);

            let mut request = self
                .client
                .run_task()
                .cluster(&self.cluster)
                .task_definition(task_definition)
                .count(chunk as i32)
                .started_by(started_by);
            if let Some(task_override) = Self::task_override(overrides) {
                request = request.overrides(task_override);
            }

            match request.send().await {
                Ok(resp) => {
                    for failure in resp.failures() {
                        let reason = failure.reason().unwrap_or("unknown").to_string();
                        tracing::warn!(task_definition, reason, "ECS task launch failure in chunk");
                        outcome.failures.push(reason);
                    }
                    for task in resp.tasks() {
                        if let Some(arn) = task.task_arn() {
                            outcome.tasks.push(arn.to_string());
                        }
                    }
                }
                Err(err) => {
                    // Any chunk that errors is logged but does not abort
                    // remaining chunks (spec §4.E).
                    tracing::warn!(task_definition, chunk, error = %err, "ECS RunTask chunk failed, continuing");
                    outcome.failures.push(err.to_string());
                }
            }

            remaining -= chunk;
        }

        outcome
    }
}
