//! Async driver for the per-thread tournament.
//!
//! Each new candidate is entered into the [`Tournament`]; the matchups it
//! unlocks are decided concurrently (structural check first, then the
//! judge), and the resulting score updates are applied and emitted in one
//! step while the state lock is held, so score lines for a candidate always
//! appear in non-decreasing order.

use std::collections::HashMap;

use cardsmith_core::protocol::ThreadEvent;
use cardsmith_core::svg::check_layout;
use cardsmith_core::tournament::{Matchup, Resolution, ScoreUpdate, Tournament};
use futures::future::try_join_all;
use tokio::sync::Mutex;

use crate::emit::Emitter;
use crate::error::GenAiError;
use crate::judge::{Choice, Judge};

struct RankState {
    tournament: Tournament,
    svgs: HashMap<String, String>,
}

/// Ranks the candidates of one generation thread.
pub struct Ranker<J> {
    judge: J,
    canvas: (u32, u32),
    emitter: Emitter,
    state: Mutex<RankState>,
}

impl<J: Judge> Ranker<J> {
    /// * `slots` - Number of candidates that take part in the tournament.
    /// * `canvas` - Card size used by the structural check.
    pub fn new(judge: J, slots: usize, canvas: (u32, u32), emitter: Emitter) -> Self {
        Self {
            judge,
            canvas,
            emitter,
            state: Mutex::new(RankState {
                tournament: Tournament::new(slots),
                svgs: HashMap::new(),
            }),
        }
    }

    /// Enter a candidate, decide every pair it unlocks, and emit the new
    /// scores. Returns the updates that were emitted.
    pub async fn rank(&self, id: String, svg: String) -> Result<Vec<ScoreUpdate>, GenAiError> {
        let todo: Vec<(Matchup, String, String)> = {
            let mut state = self.state.lock().await;
            state.svgs.insert(id.clone(), svg);
            let matchups = state.tournament.arrive(id);
            matchups
                .into_iter()
                .filter_map(|m| {
                    let first = state.svgs.get(&m.first)?.clone();
                    let second = state.svgs.get(&m.second)?.clone();
                    Some((m, first, second))
                })
                .collect()
        };
        if todo.is_empty() {
            return Ok(Vec::new());
        }

        let verdicts = try_join_all(
            todo.into_iter()
                .map(|(matchup, first, second)| self.decide(matchup, first, second)),
        )
        .await?;

        let mut state = self.state.lock().await;
        let updates = state.tournament.resolve(&verdicts);
        for update in &updates {
            self.emitter.emit(ThreadEvent::Score {
                id: update.id.clone(),
                score: clamp(update.tally.score),
                total: clamp(update.tally.total),
            })?;
        }
        Ok(updates)
    }

    async fn decide(
        &self,
        matchup: Matchup,
        first: String,
        second: String,
    ) -> Result<Resolution, GenAiError> {
        let first_fits = check_layout(&first, self.canvas).is_valid();
        let second_fits = check_layout(&second, self.canvas).is_valid();

        let resolution = match (first_fits, second_fits) {
            (false, false) => Resolution::discarded(matchup),
            (true, false) => {
                let winner = matchup.first.clone();
                Resolution::won_by(matchup, winner)
            }
            (false, true) => {
                let winner = matchup.second.clone();
                Resolution::won_by(matchup, winner)
            }
            (true, true) => match self.judge.compare(&first, &second).await? {
                Some(Choice::First) => {
                    let winner = matchup.first.clone();
                    Resolution::won_by(matchup, winner)
                }
                Some(Choice::Second) => {
                    let winner = matchup.second.clone();
                    Resolution::won_by(matchup, winner)
                }
                None => Resolution::discarded(matchup),
            },
        };
        tracing::debug!(
            first = %resolution.matchup.first,
            second = %resolution.matchup.second,
            winner = ?resolution.winner,
            "Pair decided"
        );
        Ok(resolution)
    }
}

fn clamp(count: u32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}
