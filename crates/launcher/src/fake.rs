//! Test-only launcher recording every call it receives, used by the
//! scheduler's own integration tests in place of a real ECS client.

use std::sync::Mutex;

use async_trait::async_trait;
use ecss_core::JobOverride;

use crate::launcher::TaskLauncher;
use crate::outcome::LaunchOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedLaunch {
    pub task_definition: String,
    pub count: u32,
    pub started_by: String,
}

#[derive(Default)]
pub struct FakeLauncher {
    calls: Mutex<Vec<RecordedLaunch>>,
    tasks_per_call: Vec<String>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Task arns returned from every `launch` call, in order.
    pub fn with_tasks(mut self, tasks: Vec<String>) -> Self {
        self.tasks_per_call = tasks;
        self
    }

    pub fn calls(&self) -> Vec<RecordedLaunch> {
        self.calls.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl TaskLauncher for FakeLauncher {
    async fn launch(&self, task_definition: &str, count: u32, _overrides: &[JobOverride], started_by: &str) -> LaunchOutcome {
        self.calls.lock().expect("lock poisoned").push(RecordedLaunch {
            task_definition: task_definition.to_string(),
            count,
            started_by: started_by.to_string(),
        });

        LaunchOutcome { tasks: self.tasks_per_call.clone(), failures: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_every_call() {
        let launcher = FakeLauncher::new().with_tasks(vec!["arn:task:1".to_string()]);
        let outcome = launcher.launch("my-task-def", 3, &[], "ecss-scheduler").await;

        assert_eq!(outcome.tasks, vec!["arn:task:1".to_string()]);
        assert_eq!(launcher.calls().len(), 1);
        assert_eq!(launcher.calls()[0].count, 3);
    }
}
