//! Hedged calls against overloaded generative backends.
//!
//! A call is issued once. If it has not settled after
//! [`HedgePolicy::hedge_after`], an identical duplicate is raced against it
//! and whichever settles first wins; the loser is dropped so its result can
//! never reach the caller. Each attempt that fails with a transient overload
//! is retried once after [`HedgePolicy::overload_backoff`].

use std::future::Future;
use std::time::Duration;

/// Fixed pause before retrying an overloaded attempt.
pub const DEFAULT_OVERLOAD_BACKOFF: Duration = Duration::from_millis(150);

/// Errors that signal a temporary overload worth retrying.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// Tunable parameters for [`hedged`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HedgePolicy {
    /// Delay before racing a duplicate call. `None` disables hedging.
    pub hedge_after: Option<Duration>,
    /// Pause before the single retry of an overloaded attempt.
    pub overload_backoff: Duration,
}

impl HedgePolicy {
    /// Hedge after `delay` with the default overload backoff.
    pub fn after(delay: Duration) -> Self {
        Self {
            hedge_after: Some(delay),
            overload_backoff: DEFAULT_OVERLOAD_BACKOFF,
        }
    }
}

impl Default for HedgePolicy {
    fn default() -> Self {
        Self {
            hedge_after: None,
            overload_backoff: DEFAULT_OVERLOAD_BACKOFF,
        }
    }
}

/// Run `call` under `policy`, returning the first settled result.
pub async fn hedged<F, Fut, T, E>(policy: &HedgePolicy, call: F) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient,
{
    let primary = attempt(&call, policy.overload_backoff);

    let Some(delay) = policy.hedge_after else {
        return primary.await;
    };

    let duplicate = async {
        tokio::time::sleep(delay).await;
        attempt(&call, policy.overload_backoff).await
    };

    tokio::pin!(primary);
    tokio::pin!(duplicate);

    tokio::select! {
        result = &mut primary => result,
        result = &mut duplicate => result,
    }
}

/// One attempt with a single delayed retry on overload.
async fn attempt<F, Fut, T, E>(call: &F, backoff: Duration) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient,
{
    match call().await {
        Err(e) if e.is_transient() => {
            tokio::time::sleep(backoff).await;
            call().await
        }
        other => other,
    }
}
