//! Coordinator configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use cardsmith_core::lease::{
    LeasePolicy, DEFAULT_CLAIM_BATCH, DEFAULT_CONCURRENCY, HEARTBEAT_INTERVAL_SECS,
    LIVENESS_CUTOFF_SECS,
};

use crate::error::WorkerError;

/// Default pause between claim attempts.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Default generation threads per batch.
pub const DEFAULT_GENERATION_THREADS: usize = 4;

/// Default wall-clock budget of one generation thread.
pub const DEFAULT_THREAD_TIMEOUT_SECS: u64 = 60;

/// Default generation thread program, resolved through `PATH`.
pub const DEFAULT_THREAD_PROGRAM: &str = "cardsmith-genai";

/// Default database pool size.
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 4;

/// How a generation thread is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadConfig {
    pub program: String,
    /// Arguments placed before the bundle.
    pub args: Vec<String>,
    pub timeout: Duration,
}

/// Settings of one coordinator process.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub run_migrations: bool,
    pub startup_delay: Duration,
    pub lease: LeasePolicy,
    pub poll_interval: Duration,
    pub heartbeat_interval: Duration,
    pub threads: usize,
    pub thread: ThreadConfig,
}

impl WorkerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                   | Default           |
    /// |---------------------------|-------------------|
    /// | `DATABASE_URL`            | required          |
    /// | `DB_MAX_CONNECTIONS`      | `4`               |
    /// | `RUN_MIGRATIONS`          | `true`            |
    /// | `STARTUP_DELAY_SECS`      | `0`               |
    /// | `QUEUE_CONCURRENCY`       | `26`              |
    /// | `CLAIM_BATCH_SIZE`        | `1`               |
    /// | `ACTIVE_CUTOFF_SECS`      | `50`              |
    /// | `STALE_CUTOFF_SECS`       | `50`              |
    /// | `POLL_INTERVAL_MS`        | `500`             |
    /// | `HEARTBEAT_INTERVAL_SECS` | `15`              |
    /// | `GENERATION_THREADS`      | `4`               |
    /// | `THREAD_TIMEOUT_SECS`     | `60`              |
    /// | `THREAD_PROGRAM`          | `cardsmith-genai` |
    /// | `THREAD_ARGS`             | empty             |
    pub fn from_env() -> Result<Self, WorkerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WorkerError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.is_empty())
            .ok_or_else(|| WorkerError::Config("DATABASE_URL must be set".into()))?;

        let lease = LeasePolicy {
            ceiling: parse(&lookup, "QUEUE_CONCURRENCY", DEFAULT_CONCURRENCY)?,
            claim_batch: parse(&lookup, "CLAIM_BATCH_SIZE", DEFAULT_CLAIM_BATCH)?,
            active_cutoff: Duration::from_secs(parse(
                &lookup,
                "ACTIVE_CUTOFF_SECS",
                LIVENESS_CUTOFF_SECS,
            )?),
            stale_cutoff: Duration::from_secs(parse(
                &lookup,
                "STALE_CUTOFF_SECS",
                LIVENESS_CUTOFF_SECS,
            )?),
        };

        let heartbeat_secs: u64 = parse(&lookup, "HEARTBEAT_INTERVAL_SECS", HEARTBEAT_INTERVAL_SECS)?;
        if heartbeat_secs == 0 {
            return Err(WorkerError::Config("HEARTBEAT_INTERVAL_SECS must be positive".into()));
        }
        if Duration::from_secs(heartbeat_secs) >= lease.stale_cutoff {
            tracing::warn!(
                heartbeat_secs,
                stale_cutoff_secs = lease.stale_cutoff.as_secs(),
                "Heartbeat interval is not shorter than the stale cutoff; live leases may be taken over",
            );
        }

        let threads: usize = parse(&lookup, "GENERATION_THREADS", DEFAULT_GENERATION_THREADS)?;
        if threads == 0 {
            return Err(WorkerError::Config("GENERATION_THREADS must be at least 1".into()));
        }

        let thread = ThreadConfig {
            program: lookup("THREAD_PROGRAM")
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| DEFAULT_THREAD_PROGRAM.to_string()),
            args: lookup("THREAD_ARGS")
                .map(|raw| raw.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            timeout: Duration::from_secs(parse(
                &lookup,
                "THREAD_TIMEOUT_SECS",
                DEFAULT_THREAD_TIMEOUT_SECS,
            )?),
        };

        Ok(Self {
            database_url,
            db_max_connections: parse(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            run_migrations: parse(&lookup, "RUN_MIGRATIONS", true)?,
            startup_delay: Duration::from_secs(parse(&lookup, "STARTUP_DELAY_SECS", 0)?),
            lease,
            poll_interval: Duration::from_millis(parse(
                &lookup,
                "POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            )?),
            heartbeat_interval: Duration::from_secs(heartbeat_secs),
            threads,
            thread,
        })
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, WorkerError> {
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| WorkerError::Config(format!("{name} has an invalid value: {raw:?}"))),
    }
}
