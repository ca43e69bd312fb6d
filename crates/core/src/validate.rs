//! Job field-level validator (spec §4.B).
//!
//! Aggregates every offending field into one [`ValidationError`] instead
//! of failing fast on the first problem (spec §4.B: "a single validation
//! response lists every offending field with a human-readable reason").

use std::collections::HashSet;

use serde::Serialize;

use crate::job::{Job, JobPatch, Trigger};

/// One field's validation failure.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All field failures for a single request, aggregated (spec §4.B).
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl std::error::Error for ValidationError {}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed: ")?;
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

const ID_MAX_LEN: usize = 64;
const TASK_DEFINITION_MAX_LEN: usize = 255;
const MAX_COUNT_CEILING: u32 = 50;

struct Errors(Vec<FieldError>);

impl Errors {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError { field: field.into(), message: message.into() });
    }

    fn into_result(self) -> Result<(), ValidationError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { errors: self.0 })
        }
    }
}

fn valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= ID_MAX_LEN
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Validate a job id (shared by create-time and PUT-path id checks).
pub fn validate_id(id: &str) -> Result<(), ValidationError> {
    let mut errors = Errors(Vec::new());
    if !valid_id(id) {
        errors.push("id", "must be 1-64 chars matching [A-Za-z0-9_-]+");
    }
    errors.into_result()
}

/// The three top-level keys only the engine's fire write-back may set.
const MANAGED_FIELDS: [&str; 3] = ["lastRun", "lastRunTasks", "estimatedNextRun"];

/// Remove engine-managed keys from an inbound JSON document before it is
/// deserialized into [`Job`] or [`JobPatch`] (spec I4): "the source
/// accepts and silently drops them" (spec §9 "Engine-managed fields on
/// ingress") — a client setting `lastRun` on a POST/PUT is ignored, not
/// rejected with 422.
pub fn strip_managed_fields(mut value: serde_json::Value) -> serde_json::Value {
    if let Some(obj) = value.as_object_mut() {
        for field in MANAGED_FIELDS {
            obj.remove(field);
        }
    }
    value
}

fn check_trigger(trigger: &Trigger, errors: &mut Errors) {
    match trigger.kind.as_str() {
        "sqs" => {
            let allowed: HashSet<&str> = ["queueName", "messagesPerTask"].into_iter().collect();
            for key in trigger.fields.keys() {
                if !allowed.contains(key.as_str()) {
                    errors.push(format!("trigger.{key}"), "unknown field for trigger type \"sqs\"");
                }
            }
            match trigger.fields.get("queueName") {
                Some(serde_json::Value::String(s)) if !s.is_empty() => {}
                _ => errors.push("trigger.queueName", "required, non-empty string"),
            }
            match trigger.fields.get("messagesPerTask") {
                Some(v) if v.as_u64().is_some_and(|n| n >= 1) => {}
                _ => errors.push("trigger.messagesPerTask", "required, integer >= 1"),
            }
        }
        // Unrecognized trigger types are accepted at validation time
        // (forward-compatible registry, design note "Dynamic trigger
        // dispatch") and only fail at fire time if no evaluator is
        // registered for the tag.
        _ => {}
    }
}

fn check_overrides(overrides: &[crate::job::JobOverride], errors: &mut Errors) {
    let mut seen = HashSet::new();
    for (i, o) in overrides.iter().enumerate() {
        if o.container_name.is_empty() {
            errors.push(format!("overrides[{i}].containerName"), "must not be empty");
        }
        if !seen.insert(o.container_name.clone()) {
            errors.push(format!("overrides[{i}].containerName"), "must be unique within overrides");
        }
    }
}

fn check_schedule(schedule: &str, errors: &mut Errors) {
    if schedule.trim().is_empty() {
        errors.push("schedule", "required");
        return;
    }
    if let Err(e) = ecss_schedule::check_grammar(schedule) {
        errors.push("schedule", e.to_string());
    }
}

fn check_counts(task_count: u32, max_count: Option<u32>, errors: &mut Errors) {
    if task_count < 1 || task_count > MAX_COUNT_CEILING {
        errors.push("taskCount", format!("must be between 1 and {MAX_COUNT_CEILING}"));
    }
    if let Some(max) = max_count {
        if max > MAX_COUNT_CEILING {
            errors.push("maxCount", format!("must be <= {MAX_COUNT_CEILING}"));
        }
        if max < task_count {
            errors.push("maxCount", "must be >= taskCount");
        }
    }
}

fn check_window(schedule_start: Option<chrono::DateTime<chrono::Utc>>, schedule_end: Option<chrono::DateTime<chrono::Utc>>, errors: &mut Errors) {
    if let (Some(start), Some(end)) = (schedule_start, schedule_end) {
        if end < start {
            errors.push("scheduleEnd", "must be >= scheduleStart");
        }
    }
}

/// Validate a complete job for creation. Does not resolve `?` wildcards
/// in `schedule` — callers run [`ecss_schedule::resolve_schedule`]
/// separately, before or after validating (spec I2 only requires the
/// *stored* value be resolved).
pub fn validate_job(job: &Job) -> Result<(), ValidationError> {
    let mut errors = Errors(Vec::new());

    if !valid_id(&job.id) {
        errors.push("id", "must be 1-64 chars matching [A-Za-z0-9_-]+");
    }
    if job.task_definition.is_empty() || job.task_definition.len() > TASK_DEFINITION_MAX_LEN {
        errors.push("taskDefinition", format!("must be 1-{TASK_DEFINITION_MAX_LEN} chars"));
    }
    check_schedule(&job.schedule, &mut errors);
    check_window(job.schedule_start, job.schedule_end, &mut errors);
    check_counts(job.task_count, job.max_count, &mut errors);
    if let Some(trigger) = &job.trigger {
        check_trigger(trigger, &mut errors);
    }
    check_overrides(&job.overrides, &mut errors);

    errors.into_result()
}

/// Validate a [`JobPatch`], checking only the fields it actually sets
/// (spec §3 Lifecycle: missing fields leave prior values untouched, so
/// there's nothing to validate about them here — the merged job is
/// re-validated as a whole by the caller if it wants full-record checks).
pub fn validate_patch(patch: &JobPatch) -> Result<(), ValidationError> {
    let mut errors = Errors(Vec::new());

    if let Some(schedule) = &patch.schedule {
        check_schedule(schedule, &mut errors);
    }
    if let (Some(Some(start)), Some(Some(end))) = (&patch.schedule_start, &patch.schedule_end) {
        check_window(Some(*start), Some(*end), &mut errors);
    }
    if let Some(task_count) = patch.task_count {
        let max_count = patch.max_count.flatten();
        check_counts(task_count, max_count, &mut errors);
    }
    if let Some(Some(trigger)) = &patch.trigger {
        check_trigger(trigger, &mut errors);
    }
    if let Some(overrides) = &patch.overrides {
        check_overrides(overrides, &mut errors);
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Job;

    fn base_job() -> Job {
        Job {
            id: "sleeper-task".to_string(),
            task_definition: "sleeper-task".to_string(),
            schedule: "25 */5".to_string(),
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
    fn valid_job_passes() {
        assert!(validate_job(&base_job()).is_ok());
    }

    #[test]
    fn rejects_bad_id_and_reports_all_errors_together() {
        let mut job = base_job();
        job.id = "has a space".to_string();
        job.task_count = 0;
        let err = validate_job(&job).unwrap_err();
        let fields: Vec<_> = err.errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"id"));
        assert!(fields.contains(&"taskCount"));
    }

    #[test]
    fn max_count_below_task_count_is_rejected() {
        let mut job = base_job();
        job.task_count = 10;
        job.max_count = Some(5);
        let err = validate_job(&job).unwrap_err();
        assert!(err.errors.iter().any(|e| e.field == "maxCount"));
    }

    #[test]
    fn duplicate_container_names_are_rejected() {
        let mut job = base_job();
        job.overrides = vec![
            crate::job::JobOverride { container_name: "c".to_string(), environment: Default::default() },
            crate::job::JobOverride { container_name: "c".to_string(), environment: Default::default() },
        ];
        let err = validate_job(&job).unwrap_err();
        assert!(err.errors.iter().any(|e| e.field.contains("containerName")));
    }

    #[test]
    fn sqs_trigger_requires_queue_name() {
        let mut job = base_job();
        job.trigger = Some(Trigger {
            kind: "sqs".to_string(),
            fields: serde_json::json!({ "messagesPerTask": 100 }).as_object().unwrap().clone(),
        });
        let err = validate_job(&job).unwrap_err();
        assert!(err.errors.iter().any(|e| e.field == "trigger.queueName"));
    }

    #[test]
    fn unknown_trigger_type_is_accepted_at_validation_time() {
        let mut job = base_job();
        job.trigger = Some(Trigger { kind: "webhook".to_string(), fields: Default::default() });
        assert!(validate_job(&job).is_ok());
    }

    #[test]
    fn managed_fields_are_dropped_not_rejected() {
        let value = serde_json::json!({
            "taskDefinition": "sleeper-task",
            "schedule": "25 */5",
            "lastRun": "2026-01-01T00:00:00Z",
            "lastRunTasks": ["arn:already:run"],
            "estimatedNextRun": "2026-01-02T00:00:00Z",
        });
        let stripped = strip_managed_fields(value);
        let obj = stripped.as_object().unwrap();
        assert!(!obj.contains_key("lastRun"));
        assert!(!obj.contains_key("lastRunTasks"));
        assert!(!obj.contains_key("estimatedNextRun"));
        assert!(obj.contains_key("taskDefinition"));
    }
}
