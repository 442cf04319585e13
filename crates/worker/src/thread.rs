//! One generation thread: a subprocess streaming protocol lines.
//!
//! The child receives the encoded [`ThreadBundle`] as its last argument and
//! reports on stdout. Lines are read through a bounded [`LinesCodec`],
//! decoded into [`ThreadEvent`]s and applied to the [`CandidateSink`] in
//! order. stderr is logged line by line at info and never parsed. The child
//! is killed once the stream settles, whatever the outcome.

use std::process::Stdio;

use cardsmith_core::bundle::ThreadBundle;
use cardsmith_core::protocol::{ThreadEvent, MAX_LINE_BYTES};
use cardsmith_db::models::batch::TextBatch;
use cardsmith_db::models::render::CreateRender;
use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio::process::{ChildStderr, Command};
use tokio_util::codec::{FramedRead, LinesCodec};

use crate::config::ThreadConfig;
use crate::error::ThreadError;
use crate::sink::CandidateSink;

/// What a thread produced before `end`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadReport {
    pub thread: String,
    /// `svg` events received.
    pub candidates: usize,
    /// `score` events received.
    pub scores: usize,
}

/// Spawn the thread program for `bundle` and consume its output until `end`.
///
/// Fails on a spawn error, a protocol violation, output closing before
/// `end`, a sink write failure, or the configured timeout.
pub async fn run_thread<S: CandidateSink>(
    config: &ThreadConfig,
    bundle: &ThreadBundle,
    batch: &TextBatch,
    sink: &S,
) -> Result<ThreadReport, ThreadError> {
    let encoded = bundle.encode()?;

    let mut child = Command::new(&config.program)
        .args(&config.args)
        .arg(encoded)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(ThreadError::Spawn)?;

    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(log_stderr(bundle.thread.clone(), stderr));
    }
    let stdout = child.stdout.take().ok_or(ThreadError::EarlyClose)?;
    let lines = FramedRead::new(stdout, LinesCodec::new_with_max_length(MAX_LINE_BYTES));

    let result = match tokio::time::timeout(config.timeout, consume(lines, bundle, batch, sink)).await {
        Ok(result) => result,
        Err(_elapsed) => Err(ThreadError::Timeout(config.timeout)),
    };

    if let Err(e) = child.kill().await {
        tracing::debug!(thread = %bundle.thread, error = %e, "Thread process already gone");
    }
    result
}

async fn consume<R, S>(
    mut lines: FramedRead<R, LinesCodec>,
    bundle: &ThreadBundle,
    batch: &TextBatch,
    sink: &S,
) -> Result<ThreadReport, ThreadError>
where
    R: AsyncRead + Unpin,
    S: CandidateSink,
{
    let mut report = ThreadReport {
        thread: bundle.thread.clone(),
        ..ThreadReport::default()
    };

    while let Some(line) = lines.next().await {
        match ThreadEvent::parse(&line?)? {
            ThreadEvent::Svg { id, svg } => {
                let render = CreateRender {
                    id,
                    user_id: batch.user_id.clone(),
                    batch_id: batch.id.clone(),
                    thread: bundle.thread.clone(),
                    svg,
                };
                let inserted = sink.insert(&render).await.map_err(ThreadError::Sink)?;
                if !inserted {
                    tracing::debug!(thread = %bundle.thread, candidate = %render.id, "Candidate already stored");
                }
                report.candidates += 1;
            }
            ThreadEvent::Score { id, score, total } => {
                let updated = sink
                    .update_score(&id, score, total)
                    .await
                    .map_err(ThreadError::Sink)?;
                if !updated {
                    tracing::warn!(thread = %bundle.thread, candidate = %id, "Score for unknown candidate");
                }
                report.scores += 1;
            }
            ThreadEvent::End => return Ok(report),
        }
    }
    Err(ThreadError::EarlyClose)
}

async fn log_stderr(thread: String, stderr: ChildStderr) {
    let mut lines = FramedRead::new(stderr, LinesCodec::new_with_max_length(MAX_LINE_BYTES));
    while let Some(line) = lines.next().await {
        match line {
            Ok(line) => tracing::info!(thread = %thread, stderr = %line, "Thread output"),
            Err(e) => {
                tracing::debug!(thread = %thread, error = %e, "Unreadable stderr");
                break;
            }
        }
    }
}
