//! [`SchedulerEngine`] — the widened `RuleScheduler`: in-memory trigger
//! table for every scheduled job (spec §4.F).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use ecss_core::Job;

use crate::entry::JobTrigger;
use crate::mutation::Mutation;

/// Owns the in-process trigger table. Only the engine thread may mutate
/// it (spec §5 "Shared-resource policy"); API-side code reaches it only
/// through [`Mutation`] messages.
#[derive(Default)]
pub struct SchedulerEngine {
    entries: HashMap<String, JobTrigger>,
}

impl SchedulerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the table from a full store read at boot (spec §4.C
    /// "Consistency": "the engine reads it once at boot"). Jobs whose
    /// schedule no longer parses are skipped with a warning rather than
    /// aborting the boot sequence.
    pub fn sync_from_store(&mut self, jobs: Vec<Job>) {
        self.entries.clear();
        for job in jobs {
            self.insert(job);
        }
    }

    fn insert(&mut self, job: Job) {
        let id = job.id.clone();
        if id == crate::lock::LOCK_JOB_ID {
            // The advisory lock's sentinel record lives in the same
            // store but is never a real schedulable job.
            return;
        }
        match JobTrigger::from_job(&job) {
            Ok(entry) => {
                self.entries.insert(id, entry);
            }
            Err(err) => {
                tracing::warn!(job_id = %id, error = %err, "dropping job with unparseable schedule from engine");
            }
        }
    }

    /// Apply a mutation message atomically (spec §4.G). Messages are
    /// expected to arrive in publication order; this method does not
    /// reorder them.
    pub fn apply_mutation(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::Create(job) | Mutation::Update(job) => self.insert(job),
            Mutation::Delete(id) => {
                self.entries.remove(&id);
            }
            Mutation::Pause(id) => {
                if let Some(entry) = self.entries.get_mut(&id) {
                    entry.suspended = true;
                }
            }
            Mutation::Resume(id) => {
                if let Some(entry) = self.entries.get_mut(&id) {
                    entry.suspended = false;
                }
            }
        }
    }

    /// Job ids due to fire at `now`.
    pub fn due_jobs(&self, now: DateTime<Utc>) -> Vec<String> {
        self.entries.iter().filter(|(_, entry)| entry.is_due(now)).map(|(id, _)| id.clone()).collect()
    }

    /// Record a completed fire: advances `last_run`/`estimated_next_run`
    /// in the in-memory table so the next tick doesn't immediately
    /// re-fire the same instant.
    pub fn record_fire(&mut self, job_id: &str, fired_at: DateTime<Utc>) {
        if let Some(entry) = self.entries.get_mut(job_id) {
            entry.last_run = Some(fired_at);
            entry.estimated_next_run = entry.next_fire_after(fired_at);
        }
    }

    pub fn get(&self, job_id: &str) -> Option<&JobTrigger> {
        self.entries.get(job_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: &str, schedule: &str) -> Job {
        Job {
            id: id.to_string(),
            task_definition: "sleeper-task".to_string(),
            schedule: schedule.to_string(),
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

    #[test]
    fn sync_then_apply_mutation_round_trips() {
        let mut engine = SchedulerEngine::new();
        engine.sync_from_store(vec![job("a", "0 */5 * * * * * *")]);
        assert_eq!(engine.len(), 1);

        engine.apply_mutation(Mutation::Pause("a".to_string()));
        assert!(engine.get("a").unwrap().suspended);

        engine.apply_mutation(Mutation::Delete("a".to_string()));
        assert!(engine.is_empty());
    }

    #[test]
    fn unparseable_schedule_is_dropped_not_fatal() {
        let mut engine = SchedulerEngine::new();
        engine.sync_from_store(vec![job("bad", "not a schedule at all somehow too many fields here")]);
        assert!(engine.is_empty());
    }
}
