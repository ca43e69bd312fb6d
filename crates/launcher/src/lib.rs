pub mod ecs;
pub mod error;
pub mod fake;
pub mod launcher;
pub mod outcome;

pub use ecs::EcsLauncher;
pub use error::LaunchError;
pub use fake::{FakeLauncher, RecordedLaunch};
pub use launcher::TaskLauncher;
pub use outcome::LaunchOutcome;
