//! Canonical job record (spec §3) and the partial-update mirror used by PUT.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default timezone when a job omits one.
pub fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_task_count() -> u32 {
    1
}

/// A gating/fan-out condition evaluated at fire time (spec §4.D).
///
/// `kind` is the registry tag (`trigger.type` on the wire, e.g. `"sqs"`).
/// `fields` holds the type-specific body verbatim; the trigger crate
/// interprets it once the registry resolves `kind` to an evaluator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct Trigger {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    #[schema(value_type = std::collections::HashMap<String, serde_json::Value>)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Per-container environment override (spec §3 `overrides`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobOverride {
    pub container_name: String,
    #[serde(default)]
    pub environment: HashMap<String, String>,
}

/// Canonical job record (spec §3).
///
/// Wire format is `camelCase`; this is also the shape persisted by every
/// store backend (spec §6 "Persisted layout" — "the serialization is the
/// canonical JSON produced by the validator").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub task_definition: String,
    /// 8-field schedule string with all `?` wildcards resolved (invariant I2).
    pub schedule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_end: Option<DateTime<Utc>>,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_task_count")]
    pub task_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Trigger>,
    #[serde(default)]
    pub suspended: bool,
    #[serde(default)]
    pub overrides: Vec<JobOverride>,

    // Engine-managed (spec I4): clients may not set these on ingress; the
    // validator strips them before persistence (see `validate::strip_managed`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_run_tasks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_next_run: Option<DateTime<Utc>>,
}

impl Job {
    /// Effective cap used by the fan-out formula: `min(maxCount, 50)`,
    /// or `taskCount` itself when `maxCount` is unset (spec §4.D).
    pub fn effective_max_count(&self) -> u32 {
        self.max_count.unwrap_or(50).min(50)
    }
}

/// All-optional mirror of [`Job`] for PUT partial-merge semantics
/// (spec §3 Lifecycle: "missing top-level fields leave prior values
/// untouched").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPatch {
    pub task_definition: Option<String>,
    pub schedule: Option<String>,
    pub schedule_start: Option<Option<DateTime<Utc>>>,
    pub schedule_end: Option<Option<DateTime<Utc>>>,
    pub timezone: Option<String>,
    pub task_count: Option<u32>,
    pub max_count: Option<Option<u32>>,
    pub trigger: Option<Option<Trigger>>,
    pub suspended: Option<bool>,
    pub overrides: Option<Vec<JobOverride>>,

    // Engine-managed (spec I4): only the scheduler's fire write-back sets
    // these. A client-supplied value reaching this struct would be applied
    // by `merge_onto` same as any other field, so the API layer strips
    // these three keys from the request body before deserializing into
    // `JobPatch` (spec §9 "Engine-managed fields on ingress") rather than
    // this type silently discarding them itself.
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_run_tasks: Option<Vec<String>>,
    #[serde(default)]
    pub estimated_next_run: Option<Option<DateTime<Utc>>>,
}

impl JobPatch {
    /// Apply this patch onto an existing job, field-wise (spec §3 Lifecycle).
    pub fn merge_onto(self, mut job: Job) -> Job {
        if let Some(v) = self.task_definition {
            job.task_definition = v;
        }
        if let Some(v) = self.schedule {
            job.schedule = v;
        }
        if let Some(v) = self.schedule_start {
            job.schedule_start = v;
        }
        if let Some(v) = self.schedule_end {
            job.schedule_end = v;
        }
        if let Some(v) = self.timezone {
            job.timezone = v;
        }
        if let Some(v) = self.task_count {
            job.task_count = v;
        }
        if let Some(v) = self.max_count {
            job.max_count = v;
        }
        if let Some(v) = self.trigger {
            job.trigger = v;
        }
        if let Some(v) = self.suspended {
            job.suspended = v;
        }
        if let Some(v) = self.overrides {
            job.overrides = v;
        }
        if let Some(v) = self.last_run {
            job.last_run = Some(v);
        }
        if let Some(v) = self.last_run_tasks {
            job.last_run_tasks = v;
        }
        if let Some(v) = self.estimated_next_run {
            job.estimated_next_run = v;
        }
        job
    }
}

/// A page of jobs returned by `JobStore::list` (spec §4.C).
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct JobPage {
    pub items: Vec<Job>,
    pub total: usize,
}

/// If the inbound document omits `id`, default it to `taskDefinition`
/// (spec §8 scenario 1: a POST body with no `id` stores under the task
/// definition's name). Only acts when `id` is absent or blank — an
/// explicit empty string still fails `validate_job`'s length check
/// rather than being silently defaulted.
pub fn default_id_from_task_definition(mut value: serde_json::Value) -> serde_json::Value {
    let needs_default = matches!(value.get("id"), None | Some(serde_json::Value::Null))
        || value.get("id").and_then(|v| v.as_str()).is_some_and(str::is_empty);
    if needs_default {
        if let Some(task_definition) = value.get("taskDefinition").cloned() {
            if let Some(obj) = value.as_object_mut() {
                obj.insert("id".to_string(), task_definition);
            }
        }
    }
    value
}
