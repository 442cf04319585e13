//! Processing of one claimed batch: fan out generation threads, wait for all
//! of them, release the batch.

use std::time::Instant;

use cardsmith_core::bundle::{alignment_for_thread, FontRef, ThreadBundle};
use cardsmith_core::lease::new_tag;
use cardsmith_db::models::batch::TextBatch;
use cardsmith_db::repositories::{BatchRepo, FontRepo};
use cardsmith_db::DbPool;
use futures::future::join_all;

use crate::config::ThreadConfig;
use crate::error::{PrepareError, WorkerError};
use crate::sink::CandidateSink;
use crate::thread::run_thread;

/// Outcome of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub batch_id: String,
    pub threads: usize,
    pub failed_threads: usize,
    pub candidates: usize,
    pub elapsed_ms: i32,
}

/// Runs batches against a candidate sink.
pub struct Pipeline<S> {
    pool: DbPool,
    sink: S,
    threads: usize,
    thread: ThreadConfig,
}

impl<S: CandidateSink> Pipeline<S> {
    /// * `threads` - Generation threads launched per batch.
    pub fn new(pool: DbPool, sink: S, threads: usize, thread: ThreadConfig) -> Self {
        Self {
            pool,
            sink,
            threads,
            thread,
        }
    }

    /// Process `batch` and mark it ready.
    ///
    /// Thread failures, unreadable payloads and unknown fonts are logged and
    /// counted; the batch is released regardless. Store errors are returned
    /// and leave the batch unreleased.
    pub async fn run_batch(&self, batch: &TextBatch) -> Result<BatchReport, WorkerError> {
        let started = Instant::now();
        let short = short_id(&batch.id);
        let mut report = BatchReport {
            batch_id: batch.id.clone(),
            ..BatchReport::default()
        };

        match self.bundles(batch).await {
            Ok(bundles) => {
                report.threads = bundles.len();
                let runs = bundles
                    .iter()
                    .map(|bundle| run_thread(&self.thread, bundle, batch, &self.sink));
                for (bundle, result) in bundles.iter().zip(join_all(runs).await) {
                    match result {
                        Ok(thread) => {
                            tracing::info!(
                                batch = %short,
                                thread = %thread.thread,
                                candidates = thread.candidates,
                                scores = thread.scores,
                                "Thread complete",
                            );
                            report.candidates += thread.candidates;
                        }
                        Err(e) => {
                            tracing::warn!(batch = %short, thread = %bundle.thread, error = %e, "Thread failed");
                            report.failed_threads += 1;
                        }
                    }
                }
            }
            Err(PrepareError::Store(e)) => return Err(e.into()),
            Err(e) => {
                tracing::warn!(batch = %short, error = %e, "Batch skipped");
            }
        }

        report.elapsed_ms = i32::try_from(started.elapsed().as_millis()).unwrap_or(i32::MAX);
        if !BatchRepo::mark_ready(&self.pool, &batch.id, report.elapsed_ms).await? {
            tracing::warn!(batch = %short, "Batch vanished before release");
        }

        tracing::info!(
            batch = %short,
            threads = report.threads,
            failed = report.failed_threads,
            candidates = report.candidates,
            elapsed_ms = report.elapsed_ms,
            "Batch ready",
        );
        Ok(report)
    }

    /// One bundle per thread, each with its own tag and alignment hint.
    async fn bundles(&self, batch: &TextBatch) -> Result<Vec<ThreadBundle>, PrepareError> {
        let texts = batch.ordered_texts()?;
        let dimens = batch.orientation()?;
        let fonts = self.resolve_fonts(batch).await?;

        Ok((0..self.threads)
            .map(|index| ThreadBundle {
                thread: new_tag(),
                dimens,
                front: batch.is_front,
                texts: texts.clone(),
                fonts: fonts.clone(),
                align: alignment_for_thread(index),
            })
            .collect())
    }

    async fn resolve_fonts(&self, batch: &TextBatch) -> Result<Vec<FontRef>, PrepareError> {
        let names = batch.font_names();
        if names.is_empty() {
            return Err(PrepareError::NoFonts);
        }

        let mut fonts = Vec::with_capacity(names.len());
        for name in names {
            let font = FontRepo::find_by_name(&self.pool, name)
                .await?
                .ok_or_else(|| PrepareError::MissingFont(name.to_string()))?;
            fonts.push(FontRef::from(&font));
        }
        Ok(fonts)
    }
}

/// First segment of an id, for log lines.
pub(crate) fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
