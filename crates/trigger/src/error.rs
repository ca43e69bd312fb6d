use thiserror::Error;

/// Trigger evaluation failures. Absorbed by the scheduler (spec §7:
/// "logged; fire skipped (no launch)") — never surfaced as an HTTP
/// status, so this taxonomy lives here rather than in `ecss-core`.
#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("no trigger evaluator registered for type {0:?}")]
    UnknownType(String),

    #[error("trigger spec for type {0:?} is malformed: {1}")]
    MalformedSpec(String, String),

    #[error("probe failed: {0}")]
    ProbeFailed(String),
}
