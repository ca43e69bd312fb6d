//! Graceful shutdown (spec §5 "Cancellation"): "drains the mutation
//! channel, stops accepting new fires, waits for in-flight fires up to a
//! bounded grace period, then exits."

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Default grace period for in-flight fires to finish after shutdown is
/// requested.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(30);

/// Shared cancellation handle. Cloned into the tick loop and into
/// whatever signal handler (SIGTERM, a CLI `Ctrl-C` listener) triggers
/// shutdown.
#[derive(Clone)]
pub struct Shutdown {
    token: CancellationToken,
    grace_period: Duration,
}

impl Shutdown {
    pub fn new(grace_period: Duration) -> Self {
        Self { token: CancellationToken::new(), grace_period }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Request shutdown; idempotent.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD)
    }
}
