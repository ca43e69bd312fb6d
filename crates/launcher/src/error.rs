use thiserror::Error;

/// Absorbed by the scheduler (spec §7: "logged; does not abort the
/// fire") — never surfaced as an HTTP status.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("orchestrator rejected chunk: {0}")]
    ChunkFailed(String),

    #[error("orchestrator client unavailable: {0}")]
    ClientUnavailable(String),
}
