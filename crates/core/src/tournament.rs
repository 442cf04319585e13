//! Incremental all-pairs tournament over a fixed number of slots.
//!
//! Candidates arrive one at a time. Each arrival takes the next slot, and
//! every unordered pair of occupied slots is scheduled exactly once over the
//! tournament's lifetime. Arrivals beyond the slot count are recorded but
//! never compared.
//!
//! The engine is synchronous bookkeeping only: [`Tournament::arrive`] hands
//! out [`Matchup`]s, the caller judges them however it likes (concurrently,
//! across await points), then feeds the verdicts to [`Tournament::resolve`]
//! in one batch so every `total` bump lands together with its wins.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

/// Default slot count: one per generation round.
pub const DEFAULT_SLOTS: usize = 4;

/// Unordered pair of arrival indices, stored as `(low, high)`.
pub type PairKey = (usize, usize);

/// Running result for one candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    /// Comparisons won.
    pub score: u32,
    /// Comparisons participated in (discarded pairs excluded).
    pub total: u32,
}

/// A pair that needs a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matchup {
    pub key: PairKey,
    pub first: String,
    pub second: String,
}

/// Verdict for one [`Matchup`]. `winner` is `None` when the pair was
/// discarded (both sides invalid, or the judge gave no answer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub matchup: Matchup,
    pub winner: Option<String>,
}

impl Resolution {
    pub fn won_by(matchup: Matchup, winner: impl Into<String>) -> Self {
        Self {
            matchup,
            winner: Some(winner.into()),
        }
    }

    pub fn discarded(matchup: Matchup) -> Self {
        Self {
            matchup,
            winner: None,
        }
    }
}

/// New running result to publish for a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreUpdate {
    pub id: String,
    pub tally: Tally,
}

/// Per-owner tournament state. One instance per generation thread; never
/// shared across batches.
#[derive(Debug)]
pub struct Tournament {
    slots: usize,
    arrivals: Vec<String>,
    scheduled: HashSet<PairKey>,
    tallies: HashMap<String, Tally>,
}

impl Default for Tournament {
    fn default() -> Self {
        Self::new(DEFAULT_SLOTS)
    }
}

impl Tournament {
    pub fn new(slots: usize) -> Self {
        Self {
            slots,
            arrivals: Vec::with_capacity(slots),
            scheduled: HashSet::new(),
            tallies: HashMap::new(),
        }
    }

    /// Record a new candidate and return the pairs it made eligible.
    ///
    /// Every returned pair is marked scheduled before this returns, so a
    /// concurrent arrival can never receive it again.
    pub fn arrive(&mut self, id: impl Into<String>) -> Vec<Matchup> {
        self.arrivals.push(id.into());
        let occupied = self.arrivals.len().min(self.slots);

        let mut todo = Vec::new();
        for a in 0..occupied {
            for b in (a + 1)..occupied {
                if self.scheduled.insert((a, b)) {
                    todo.push(Matchup {
                        key: (a, b),
                        first: self.arrivals[a].clone(),
                        second: self.arrivals[b].clone(),
                    });
                }
            }
        }
        todo
    }

    /// Apply a batch of verdicts and return updated tallies for every
    /// candidate that took part in the batch, in arrival order.
    ///
    /// A winner that is not one of the pair's two sides is treated as a
    /// discard.
    pub fn resolve(&mut self, resolutions: &[Resolution]) -> Vec<ScoreUpdate> {
        let mut participants: HashSet<&str> = HashSet::new();

        for resolution in resolutions {
            let Matchup { first, second, .. } = &resolution.matchup;
            participants.insert(first);
            participants.insert(second);

            let Some(winner) = resolution
                .winner
                .as_deref()
                .filter(|w| *w == first || *w == second)
            else {
                continue;
            };

            for side in [first, second] {
                let tally = self.tallies.entry(side.clone()).or_default();
                tally.total += 1;
                if side == winner {
                    tally.score += 1;
                }
            }
        }

        self.arrivals
            .iter()
            .filter(|id| participants.remove(id.as_str()))
            .map(|id| ScoreUpdate {
                id: id.clone(),
                tally: self.tally(id),
            })
            .collect()
    }

    /// Current tally for a candidate (zero if it has not been compared).
    pub fn tally(&self, id: &str) -> Tally {
        self.tallies.get(id).copied().unwrap_or_default()
    }

    /// Number of pairs scheduled so far.
    pub fn scheduled_pairs(&self) -> usize {
        self.scheduled.len()
    }

    /// Number of candidates recorded so far.
    pub fn arrivals(&self) -> usize {
        self.arrivals.len()
    }
}
