//! Fire procedure (spec §4.F): evaluate trigger, launch, write back,
//! log. Any step's failure is caught and logged; the schedule stays
//! active (§4.F "failures are logged ... the fire is considered
//! complete").

use std::sync::Arc;

use chrono::Utc;
use ecss_core::{Job, JobPatch};
use ecss_launcher::{LaunchOutcome, TaskLauncher};
use ecss_store::JobStore;
use ecss_trigger::{clamp_triggered, clamp_untriggered, TriggerRegistry};

/// Runs one job's fire to completion. Never returns an error: every
/// failure mode is logged with the job id and swallowed here, matching
/// the teacher's `RuleScheduler::record_trigger` being called
/// unconditionally once a rule is judged due.
pub async fn fire_job(job: Job, store: Arc<dyn JobStore>, triggers: Arc<TriggerRegistry>, launcher: Arc<dyn TaskLauncher>) {
    let job_id = job.id.clone();

    let launch_count = match &job.trigger {
        Some(trigger) => match triggers.evaluate(&trigger.kind, &trigger.fields).await {
            Ok(desired) => clamp_triggered(&job, desired),
            Err(err) => {
                tracing::warn!(job_id = %job_id, error = %err, "trigger evaluation failed, fire aborted with no launch");
                return;
            }
        },
        None => clamp_untriggered(&job),
    };

    let outcome = if launch_count > 0 {
        launcher.launch(&job.task_definition, launch_count, &job.overrides, "ecss-scheduler").await
    } else {
        LaunchOutcome::default()
    };

    if !outcome.failures.is_empty() {
        tracing::warn!(job_id = %job_id, failures = ?outcome.failures, "launch reported partial failures");
    }

    let now = Utc::now();
    let patch = JobPatch {
        last_run: Some(now),
        last_run_tasks: Some(outcome.tasks.clone()),
        ..Default::default()
    };

    if let Err(err) = store.update(&job_id, patch).await {
        tracing::warn!(job_id = %job_id, error = %err, "fire write-back failed");
    }

    tracing::info!(job_id = %job_id, launched = outcome.tasks.len(), requested = launch_count, "job fired");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ecss_core::Job;
    use ecss_launcher::FakeLauncher;
    use ecss_store::MemoryStore;
    use ecss_trigger::TriggerRegistry;

    use super::*;

    fn job(id: &str) -> Job {
        Job {
            id: id.to_string(),
            task_definition: "sleeper-task".to_string(),
            schedule: "0 */5 * * * * * *".to_string(),
            schedule_start: None,
            schedule_end: None,
            timezone: "UTC".to_string(),
            task_count: 2,
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
    async fn untriggered_job_launches_task_count_and_writes_back() {
        let store: Arc<dyn JobStore> = Arc::new(MemoryStore::new());
        store.create(job("a")).await.unwrap();
        let launcher = Arc::new(FakeLauncher::new().with_tasks(vec!["arn:1".to_string(), "arn:2".to_string()]));
        let triggers = Arc::new(TriggerRegistry::new());

        fire_job(job("a"), store.clone(), triggers, launcher.clone()).await;

        let stored = store.get("a").await.unwrap();
        assert_eq!(stored.last_run_tasks, vec!["arn:1".to_string(), "arn:2".to_string()]);
        assert!(stored.last_run.is_some());
        assert_eq!(launcher.calls()[0].count, 2);
    }

    #[tokio::test]
    async fn unknown_trigger_type_aborts_with_no_launch() {
        let store: Arc<dyn JobStore> = Arc::new(MemoryStore::new());
        let mut j = job("b");
        j.trigger = Some(ecss_core::Trigger { kind: "no-such-type".to_string(), fields: Default::default() });
        store.create(j.clone()).await.unwrap();
        let launcher = Arc::new(FakeLauncher::new());
        let triggers = Arc::new(TriggerRegistry::new());

        fire_job(j, store.clone(), triggers, launcher.clone()).await;

        assert!(launcher.calls().is_empty());
        // no write-back occurred since the fire aborted before that step
        assert!(store.get("b").await.unwrap().last_run.is_none());
    }
}
