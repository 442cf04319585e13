//! Lease constants, claim sizing, and heartbeat alignment.
//!
//! A lease is the `(worker, worker_alive)` pair on a batch row. These pure
//! functions decide how many batches a coordinator may claim and which
//! heartbeats count as alive; the SQL lives in `cardsmith-db`.

use std::time::Duration;

use chrono::{DateTime, TimeDelta};

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Heartbeat age after which a lease is considered abandoned.
pub const LIVENESS_CUTOFF_SECS: u64 = 50;

/// Global ceiling on batches being processed across all coordinators.
///
/// Sized from the generative backend's request budget: one batch issues
/// roughly 52 model calls over ~12 seconds.
pub const DEFAULT_CONCURRENCY: i64 = 26;

/// Batches taken per claim. Kept at 1 so many coordinators share work evenly.
pub const DEFAULT_CLAIM_BATCH: i64 = 1;

/// Cadence of the heartbeat monitor. Divides a minute evenly.
pub const HEARTBEAT_INTERVAL_SECS: u64 = 15;

/// Length of random owner and thread tags.
const TAG_LEN: usize = 6;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Tunables for the claim section.
///
/// `active_cutoff` decides which leases count toward the global ceiling and
/// `stale_cutoff` decides which leases may be taken over. They default to the
/// same value but are kept apart so deployments can widen the gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeasePolicy {
    pub ceiling: i64,
    pub claim_batch: i64,
    pub active_cutoff: Duration,
    pub stale_cutoff: Duration,
}

impl Default for LeasePolicy {
    fn default() -> Self {
        Self {
            ceiling: DEFAULT_CONCURRENCY,
            claim_batch: DEFAULT_CLAIM_BATCH,
            active_cutoff: Duration::from_secs(LIVENESS_CUTOFF_SECS),
            stale_cutoff: Duration::from_secs(LIVENESS_CUTOFF_SECS),
        }
    }
}

impl LeasePolicy {
    /// Number of batches this coordinator may claim given `active` live leases.
    ///
    /// Returns 0 once the ceiling is met; never negative.
    pub fn claim_limit(&self, active: i64) -> i64 {
        if active >= self.ceiling {
            return 0;
        }
        (self.ceiling - active).min(self.claim_batch).max(0)
    }

    /// Heartbeats strictly newer than this instant count as active.
    pub fn active_since(&self, now: Timestamp) -> Timestamp {
        now - to_delta(self.active_cutoff)
    }

    /// Heartbeats at or before this instant may be reclaimed.
    pub fn stale_before(&self, now: Timestamp) -> Timestamp {
        now - to_delta(self.stale_cutoff)
    }

    /// Whether a lease with the given heartbeat can be claimed at `now`.
    pub fn is_claimable(&self, heartbeat: Option<Timestamp>, now: Timestamp) -> bool {
        match heartbeat {
            None => true,
            Some(at) => at <= self.stale_before(now),
        }
    }
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::seconds(LIVENESS_CUTOFF_SECS as i64))
}

// ---------------------------------------------------------------------------
// Heartbeat alignment
// ---------------------------------------------------------------------------

/// Next wall-clock instant after `now` that is a whole multiple of `cadence`
/// since the Unix epoch.
///
/// Every coordinator computes the same boundaries, so beats do not drift
/// apart no matter how long each refresh takes.
pub fn next_aligned_tick(now: Timestamp, cadence: Duration) -> Timestamp {
    let step = (cadence.as_millis() as i64).max(1);
    let next = (now.timestamp_millis().div_euclid(step) + 1) * step;
    DateTime::from_timestamp_millis(next).unwrap_or(now + to_delta(cadence))
}

/// Short random tag identifying a coordinator or a generation thread.
pub fn new_tag() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..TAG_LEN].to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
