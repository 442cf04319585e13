//! Lease renewal for every batch held by this coordinator.

use std::time::Duration;

use cardsmith_core::lease::next_aligned_tick;
use cardsmith_db::repositories::BatchRepo;
use cardsmith_db::DbPool;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::error::WorkerError;

/// Periodically refreshes `worker_alive` on the batches owned by `worker`.
///
/// Beats land on multiples of `cadence` since the Unix epoch, so every
/// coordinator renews on the same wall-clock boundaries.
pub struct Heartbeat {
    pool: DbPool,
    worker: String,
    cadence: Duration,
}

impl Heartbeat {
    pub fn new(pool: DbPool, worker: String, cadence: Duration) -> Self {
        Self {
            pool,
            worker,
            cadence,
        }
    }

    /// Beat immediately, then on every aligned tick until cancelled.
    ///
    /// Returns on the first store error.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), WorkerError> {
        tracing::info!(
            worker = %self.worker,
            cadence_secs = self.cadence.as_secs(),
            "Heartbeat started",
        );

        loop {
            self.beat().await?;

            let now = Utc::now();
            let wait = (next_aligned_tick(now, self.cadence) - now)
                .to_std()
                .unwrap_or(self.cadence);

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(worker = %self.worker, "Heartbeat stopped");
                    return Ok(());
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    /// Refresh owned leases and log the queue depth.
    pub async fn beat(&self) -> Result<(), WorkerError> {
        let refreshed = BatchRepo::refresh_heartbeats(&self.pool, &self.worker, Utc::now()).await?;
        let pending = BatchRepo::count_pending(&self.pool).await?;
        tracing::info!(worker = %self.worker, refreshed, pending, "Heartbeat");
        Ok(())
    }
}
