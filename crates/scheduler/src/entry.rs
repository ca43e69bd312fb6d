//! Per-job scheduling entry (spec §4.F), the widened `RuleScheduleEntry`.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use ecss_core::Job;
use ecss_schedule::ScheduleExpression;

/// Scheduling state for a single job, seeded from a [`Job`] and kept in
/// sync by [`crate::engine::SchedulerEngine::apply_mutation`].
#[derive(Debug, Clone)]
pub struct JobTrigger {
    pub job_id: String,
    pub schedule: ScheduleExpression,
    pub timezone: Tz,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub suspended: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub estimated_next_run: Option<DateTime<Utc>>,
}

impl JobTrigger {
    /// Parse `job`'s schedule and timezone into engine-ready state. A
    /// malformed timezone falls back to UTC with a warning rather than
    /// dropping the job from the schedule entirely — the validator
    /// should have already rejected it, so this is a defense against a
    /// record that was valid under an older rule set.
    pub fn from_job(job: &Job) -> Result<Self, ecss_schedule::ScheduleError> {
        let schedule = ScheduleExpression::parse(&job.schedule)?;
        let timezone: Tz = job.timezone.parse().unwrap_or_else(|_| {
            tracing::warn!(job_id = %job.id, timezone = %job.timezone, "unrecognized timezone, falling back to UTC");
            Tz::UTC
        });

        Ok(Self {
            job_id: job.id.clone(),
            schedule,
            timezone,
            scheduled_start: job.schedule_start,
            scheduled_end: job.schedule_end,
            suspended: job.suspended,
            last_run: job.last_run,
            estimated_next_run: job.estimated_next_run,
        })
    }

    /// Whether this job should fire at `now` (spec §4.F "Fire procedure",
    /// §5 "Skew": "missed fires ... are not replayed").
    ///
    /// Mirrors `is_cron_due`: a job is due if its schedule has a tick
    /// strictly after `last_run` (or, absent a prior run, within the last
    /// day) at or before `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if self.suspended {
            return false;
        }
        if let Some(start) = self.scheduled_start {
            if now < start {
                return false;
            }
        }
        if let Some(end) = self.scheduled_end {
            if now > end {
                return false;
            }
        }

        let now_tz = now.with_timezone(&self.timezone);
        let check_from = self.last_run.map(|t| t.with_timezone(&self.timezone)).unwrap_or(now_tz - Duration::days(1));

        match self.schedule.next_fire(check_from) {
            Some(next) => next <= now_tz,
            None => false,
        }
    }

    /// The next tick strictly after `now`, for `estimatedNextRun`.
    pub fn next_fire_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let now_tz = now.with_timezone(&self.timezone);
        self.schedule.next_fire(now_tz).map(|t| t.with_timezone(&Utc))
    }
}
