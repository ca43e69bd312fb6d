/// Result of a `launch` call: successfully started task ids plus any
/// per-chunk failure reasons (spec §4.E). `tasks` becomes `lastRunTasks`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOutcome {
    pub tasks: Vec<String>,
    pub failures: Vec<String>,
}

impl LaunchOutcome {
    pub fn merge(&mut self, other: LaunchOutcome) {
        self.tasks.extend(other.tasks);
        self.failures.extend(other.failures);
    }
}
