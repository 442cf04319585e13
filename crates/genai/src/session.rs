//! The draft / rank / critique rounds of one generation thread.

use std::sync::Arc;

use cardsmith_core::bundle::ThreadBundle;
use cardsmith_core::protocol::ThreadEvent;
use futures::future::join_all;

use crate::designer::{Conversation, Designer};
use crate::emit::Emitter;
use crate::error::GenAiError;
use crate::judge::Judge;
use crate::ranker::Ranker;

/// Outcome of a completed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Candidates emitted.
    pub candidates: usize,
    /// Whether a draft without an SVG ended the session early.
    pub stopped_early: bool,
}

/// Runs the rounds for one bundle.
pub struct Session<D, J> {
    designer: D,
    ranker: Arc<Ranker<J>>,
    emitter: Emitter,
    rounds: usize,
}

impl<D, J> Session<D, J>
where
    D: Designer,
    J: Judge + 'static,
{
    pub fn new(designer: D, judge: J, bundle: &ThreadBundle, rounds: usize, emitter: Emitter) -> Self {
        let canvas = bundle.layout_orientation().canvas();
        Self {
            designer,
            ranker: Arc::new(Ranker::new(judge, rounds, canvas, emitter.clone())),
            emitter,
            rounds,
        }
    }

    /// Draft up to `rounds` candidates, rank them in the background, and
    /// emit `end` once every ranking has finished.
    ///
    /// Any backend error aborts the session without `end`.
    pub async fn run(self, bundle: &ThreadBundle) -> Result<SessionSummary, GenAiError> {
        let mut conversation = Conversation::start(bundle);
        let mut rankings = Vec::with_capacity(self.rounds);
        let mut summary = SessionSummary {
            candidates: 0,
            stopped_early: false,
        };

        for round in 0..self.rounds {
            let Some(svg) = self.designer.draft(&conversation).await? else {
                tracing::warn!(thread = %bundle.thread, round, "No SVG in draft, stopping");
                summary.stopped_early = true;
                break;
            };

            let id = uuid::Uuid::now_v7().to_string();
            self.emitter.emit(ThreadEvent::Svg {
                id: id.clone(),
                svg: svg.clone(),
            })?;
            summary.candidates += 1;
            tracing::info!(thread = %bundle.thread, round, candidate = %id, "Candidate emitted");

            let ranker = Arc::clone(&self.ranker);
            let candidate = svg.clone();
            rankings.push(tokio::spawn(async move { ranker.rank(id, candidate).await }));

            if round + 1 == self.rounds {
                break;
            }

            let guidance = self.designer.critique(bundle, &svg).await?;
            conversation.refine(&svg, &guidance);
        }

        for ranking in join_all(rankings).await {
            ranking??;
        }

        self.emitter.emit(ThreadEvent::End)?;
        Ok(summary)
    }
}
