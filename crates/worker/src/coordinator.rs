//! The claim loop of one coordinator process.
//!
//! Every `poll_interval` the coordinator claims what the lease policy allows
//! and spawns one [`Pipeline::run_batch`] per claimed batch without waiting
//! for it. A heartbeat runs alongside. A fatal error from either stops the
//! loop and aborts in-flight batches, whose leases then go stale. Cancellation
//! stops claiming and waits for in-flight batches to finish.

use std::sync::Arc;
use std::time::Duration;

use cardsmith_core::lease::LeasePolicy;
use cardsmith_db::repositories::BatchRepo;
use cardsmith_db::DbPool;
use chrono::Utc;
use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::WorkerError;
use crate::heartbeat::Heartbeat;
use crate::pipeline::{short_id, Pipeline};
use crate::sink::CandidateSink;

/// Claims batches and hands them to the pipeline.
pub struct Coordinator<S> {
    pool: DbPool,
    worker: String,
    policy: LeasePolicy,
    poll_interval: Duration,
    heartbeat_interval: Duration,
    pipeline: Arc<Pipeline<S>>,
}

impl<S: CandidateSink + 'static> Coordinator<S> {
    /// * `worker` - Owner tag stamped on claimed batches.
    pub fn new(
        pool: DbPool,
        worker: String,
        policy: LeasePolicy,
        poll_interval: Duration,
        heartbeat_interval: Duration,
        pipeline: Pipeline<S>,
    ) -> Self {
        Self {
            pool,
            worker,
            policy,
            poll_interval,
            heartbeat_interval,
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn worker(&self) -> &str {
        &self.worker
    }

    /// Run until `cancel` fires or a fatal error occurs.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), WorkerError> {
        tracing::info!(
            worker = %self.worker,
            ceiling = self.policy.ceiling,
            claim_batch = self.policy.claim_batch,
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Coordinator started",
        );

        let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel::<WorkerError>();

        // Outlives `cancel` so leases stay fresh while in-flight batches drain.
        let heartbeat_cancel = CancellationToken::new();
        let heartbeat = Heartbeat::new(self.pool.clone(), self.worker.clone(), self.heartbeat_interval);
        let heartbeat_fatal = fatal_tx.clone();
        let heartbeat_token = heartbeat_cancel.clone();
        let heartbeat_task = tokio::spawn(async move {
            if let Err(e) = heartbeat.run(heartbeat_token).await {
                let _ = heartbeat_fatal.send(e);
            }
        });

        let mut in_flight: Vec<JoinHandle<()>> = Vec::new();
        let outcome = loop {
            let claimed = tokio::select! {
                _ = cancel.cancelled() => break Ok(()),
                Some(e) = fatal_rx.recv() => break Err(e),
                claimed = BatchRepo::claim(&self.pool, &self.worker, &self.policy, Utc::now()) => claimed,
            };
            let batches = match claimed {
                Ok(batches) => batches,
                Err(e) => break Err(e.into()),
            };

            for batch in batches {
                tracing::info!(worker = %self.worker, batch = %short_id(&batch.id), "Batch claimed");
                let pipeline = Arc::clone(&self.pipeline);
                let fatal = fatal_tx.clone();
                in_flight.push(tokio::spawn(async move {
                    if let Err(e) = pipeline.run_batch(&batch).await {
                        let _ = fatal.send(e);
                    }
                }));
            }
            in_flight.retain(|handle| !handle.is_finished());

            tokio::select! {
                _ = cancel.cancelled() => break Ok(()),
                Some(e) = fatal_rx.recv() => break Err(e),
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        };

        let outcome = match outcome {
            Ok(()) => {
                tracing::info!(worker = %self.worker, in_flight = in_flight.len(), "Coordinator draining");
                for result in join_all(in_flight).await {
                    result?;
                }
                fatal_rx.try_recv().map_or(Ok(()), Err)
            }
            Err(e) => {
                for handle in &in_flight {
                    handle.abort();
                }
                Err(e)
            }
        };
        if let Err(e) = &outcome {
            tracing::error!(worker = %self.worker, error = %e, "Coordinator stopping");
        }

        heartbeat_cancel.cancel();
        heartbeat_task.await?;
        outcome
    }
}
