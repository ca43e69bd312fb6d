//! Fan-out clamp formula (spec §4.D). Lives here rather than in
//! `ecss-scheduler` because both the scheduler's fire procedure and the
//! REST "dry-run" endpoint need it, and both must stay provably
//! consistent.

use ecss_core::Job;

/// Launch count for a job with an active trigger: `clamp(max(taskCount,
/// desired), 0, min(maxCount, 50))` — except `desired == 0` (an
/// observed-empty queue) always means "do not launch" regardless of
/// `taskCount` (spec §8 testable property "Trigger fan-out": "for D=0,
/// launched count is 0").
pub fn clamp_triggered(job: &Job, desired: u32) -> u32 {
    if desired == 0 {
        return 0;
    }
    let floor = job.task_count.max(desired);
    floor.min(job.effective_max_count())
}

/// Launch count for a job without a trigger: `min(taskCount, maxCount or
/// 50)`.
pub fn clamp_untriggered(job: &Job) -> u32 {
    job.task_count.min(job.effective_max_count())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(task_count: u32, max_count: Option<u32>) -> Job {
        Job {
            id: "j".to_string(),
            task_definition: "t".to_string(),
            schedule: "0 0 *".to_string(),
            schedule_start: None,
            schedule_end: None,
            timezone: "UTC".to_string(),
            task_count,
            max_count,
            trigger: None,
            suspended: false,
            overrides: Vec::new(),
            last_run: None,
            last_run_tasks: Vec::new(),
            estimated_next_run: None,
        }
    }

    #[test]
    fn triggered_scenario_from_spec() {
        // taskCount default 1, messagesPerTask=100, depth=250 -> desired=3
        let j = job(1, None);
        assert_eq!(clamp_triggered(&j, 3), 3);
    }

    #[test]
    fn triggered_scenario_capped_by_max_count() {
        // maxCount=10, depth=5000, messagesPerTask=100 -> desired=50, capped at 10
        let j = job(1, Some(10));
        assert_eq!(clamp_triggered(&j, 50), 10);
    }

    #[test]
    fn triggered_zero_depth_means_no_launch() {
        let j = job(1, None);
        assert_eq!(clamp_triggered(&j, 0), 0);
    }

    #[test]
    fn untriggered_uses_task_count_capped_by_max() {
        assert_eq!(clamp_untriggered(&job(5, None)), 5);
        assert_eq!(clamp_untriggered(&job(5, Some(3))), 3);
    }
}
