//! Graceful shutdown via `CancellationToken`.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Default grace period before in-flight work is abandoned.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Signals the serve loop to stop accepting and drains it.
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    /// Create a new coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone of the cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Initiate shutdown.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Whether a shutdown has been initiated.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel the token and wait up to `grace` for `handles` to finish.
    ///
    /// Returns `false` if the grace period ran out first.
    pub async fn graceful_shutdown(&self, handles: Vec<JoinHandle<()>>, grace: Duration) -> bool {
        self.shutdown();
        info!(
            tasks = handles.len(),
            grace_secs = grace.as_secs(),
            "draining in-flight requests"
        );

        let drained = tokio::time::timeout(grace, futures::future::join_all(handles))
            .await
            .is_ok();
        if !drained {
            warn!(?grace, "grace period elapsed before all requests finished");
        }
        drained
    }
}
