//! Shared application state handed to every handler (spec §4.H).

use std::sync::Arc;

use ecss_core::Config;
use ecss_scheduler::Mutation;
use ecss_store::JobStore;
use ecss_trigger::TriggerRegistry;
use tokio::sync::mpsc;

/// The server-side slice of the engine: a handle to the store for reads
/// and the mutation channel's producer half for publishing changes after
/// a successful write (spec §4.G). The engine itself runs in a
/// background task spawned from `main` and is never reachable directly
/// from a handler.
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub mutations: mpsc::Sender<Mutation>,
    pub triggers: Arc<TriggerRegistry>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn JobStore>, mutations: mpsc::Sender<Mutation>, triggers: Arc<TriggerRegistry>, config: Config) -> Self {
        Self { store, mutations, triggers, config }
    }
}
