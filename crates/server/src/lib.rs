//! `ecss-server`: the REST surface (spec §4.H) binding the scheduler
//! engine, job store, and trigger registry together behind an `axum`
//! router.

pub mod cli;
pub mod doc;
pub mod error;
pub mod router;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
