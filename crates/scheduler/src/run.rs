//! Tick loop (spec §4.F, §5): wakes on a short interval, drains the
//! mutation channel (spec §4.G "processed in publication order"), then
//! spawns one task per due job so a slow `launch` doesn't delay others
//! (spec §5 "each fire runs on its own worker").

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ecss_launcher::TaskLauncher;
use ecss_store::JobStore;
use ecss_trigger::TriggerRegistry;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::engine::SchedulerEngine;
use crate::fire::fire_job;
use crate::lock::AdvisoryLock;
use crate::mutation::Mutation;
use crate::shutdown::Shutdown;

/// Default tick interval. The teacher's `rules-worker` bin loop polls at
/// a similarly short cadence; schedules here are second-resolution, so
/// this stays well under a minute.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Drives the engine until `shutdown` is triggered. Consumes `engine`
/// and `mutations`; the caller owns the `mpsc::Sender<Mutation>` half
/// and gives it to the API layer.
pub async fn run(
    mut engine: SchedulerEngine,
    mut mutations: mpsc::Receiver<Mutation>,
    store: Arc<dyn JobStore>,
    triggers: Arc<TriggerRegistry>,
    launcher: Arc<dyn TaskLauncher>,
    lock: Arc<AdvisoryLock>,
    shutdown: Shutdown,
    tick_interval: Duration,
) {
    let mut ticker = tokio::time::interval(tick_interval);
    let mut in_flight = JoinSet::new();
    let cancelled = shutdown.token();

    loop {
        tokio::select! {
            _ = cancelled.cancelled() => {
                tracing::info!("scheduler shutdown requested, stopping new fires");
                break;
            }
            _ = ticker.tick() => {
                drain_mutations(&mut mutations, &mut engine);

                if let Err(err) = lock.heartbeat().await {
                    tracing::error!(error = %err, "failed to refresh scheduler lock heartbeat");
                }

                let now = Utc::now();
                for job_id in engine.due_jobs(now) {
                    engine.record_fire(&job_id, now);
                    match store.get(&job_id).await {
                        Ok(job) => {
                            let store = store.clone();
                            let triggers = triggers.clone();
                            let launcher = launcher.clone();
                            in_flight.spawn(async move { fire_job(job, store, triggers, launcher).await });
                        }
                        Err(err) => {
                            tracing::warn!(job_id = %job_id, error = %err, "could not load due job from store, skipping fire");
                        }
                    }
                }

                while in_flight.try_join_next().is_some() {}
            }
        }
    }

    // Shutdown: one last drain, then wait for in-flight fires up to the
    // grace period (spec §5 "Cancellation").
    drain_mutations(&mut mutations, &mut engine);

    let wait_for_in_flight = async {
        while in_flight.join_next().await.is_some() {}
    };
    if tokio::time::timeout(shutdown.grace_period(), wait_for_in_flight).await.is_err() {
        tracing::warn!("scheduler shutdown grace period elapsed with fires still in flight");
    }
}

fn drain_mutations(mutations: &mut mpsc::Receiver<Mutation>, engine: &mut SchedulerEngine) {
    while let Ok(mutation) = mutations.try_recv() {
        tracing::debug!(job_id = %mutation.job_id(), "applying mutation");
        engine.apply_mutation(mutation);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use ecss_core::Job;
    use ecss_launcher::FakeLauncher;
    use ecss_store::MemoryStore;
    use ecss_trigger::TriggerRegistry;
    use tokio::sync::mpsc;

    use super::*;
    use crate::lock::AdvisoryLock;

    fn job(id: &str) -> Job {
        Job {
            id: id.to_string(),
            task_definition: "sleeper-task".to_string(),
            schedule: "* * * * * * * *".to_string(),
            schedule_start: None,
            schedule_end: None,
            timezone: "UTC".to_string(),
            task_count: 1,
            max_count: None,
            trigger: None,
            suspended: false,
            overrides: Vec::new(),
            last_run: None,
            last_run_tasks: Vec::new(),
            estimated_next_run: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn tick_loop_fires_due_job_then_shuts_down_cleanly() {
        let store: Arc<dyn JobStore> = Arc::new(MemoryStore::new());
        store.create(job("a")).await.unwrap();

        let mut engine = SchedulerEngine::new();
        engine.sync_from_store(vec![store.get("a").await.unwrap()]);

        let (_tx, rx) = mpsc::channel(8);
        let launcher = Arc::new(FakeLauncher::new().with_tasks(vec!["arn:1".to_string()]));
        let triggers = Arc::new(TriggerRegistry::new());
        let lock = Arc::new(AdvisoryLock::new(store.clone(), "test-proc"));
        lock.acquire().await.unwrap();
        let shutdown = Shutdown::new(Duration::from_secs(5));

        let shutdown_clone = shutdown.clone();
        let run_handle = tokio::spawn(run(engine, rx, store.clone(), triggers, launcher.clone(), lock, shutdown, Duration::from_millis(10)));

        tokio::time::advance(Duration::from_millis(50)).await;
        shutdown_clone.trigger();
        run_handle.await.unwrap();

        assert!(!launcher.calls().is_empty());
    }
}
