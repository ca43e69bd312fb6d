//! In-process scheduler engine (spec §4.F, §4.G, §5): an in-memory
//! trigger table seeded from the store at boot, mutated only through a
//! single-consumer channel, driven by a tick loop that fires due jobs
//! concurrently.

pub mod engine;
pub mod entry;
pub mod fire;
pub mod lock;
pub mod mutation;
pub mod run;
pub mod shutdown;

pub use engine::SchedulerEngine;
pub use entry::JobTrigger;
pub use fire::fire_job;
pub use lock::{AdvisoryLock, LockError, LOCK_JOB_ID};
pub use mutation::Mutation;
pub use run::{run, DEFAULT_TICK_INTERVAL};
pub use shutdown::{Shutdown, DEFAULT_GRACE_PERIOD};
