//! `TaskLauncher` contract (spec §4.E).

use async_trait::async_trait;
use ecss_core::JobOverride;

use crate::outcome::LaunchOutcome;

#[async_trait]
pub trait TaskLauncher: Send + Sync {
    async fn launch(
        &self,
        task_definition: &str,
        count: u32,
        overrides: &[JobOverride],
        started_by: &str,
    ) -> LaunchOutcome;
}
