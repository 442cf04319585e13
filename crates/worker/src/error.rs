//! Error types for the coordinator.
//!
//! [`WorkerError`] is fatal: it stops the coordinator and the process exits
//! non-zero. [`PrepareError`] skips the threads of one batch, which is still
//! released; its `Store` variant is the exception and is escalated to
//! [`WorkerError::Database`]. [`ThreadError`] fails one generation thread only.

use std::time::Duration;

use cardsmith_core::bundle::BundleError;
use cardsmith_core::error::CoreError;
use cardsmith_core::protocol::ProtocolError;
use tokio_util::codec::LinesCodecError;

/// Unrecoverable coordinator failure.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A batch whose payload cannot be turned into thread bundles.
#[derive(Debug, thiserror::Error)]
pub enum PrepareError {
    #[error("Unreadable texts: {0}")]
    Texts(#[from] CoreError),

    #[error("Unreadable dimens: {0}")]
    Dimens(#[from] BundleError),

    #[error("Batch lists no fonts")]
    NoFonts,

    #[error("Unknown font: {0}")]
    MissingFont(String),

    #[error("Font lookup failed: {0}")]
    Store(#[from] sqlx::Error),
}

/// Failure of one generation thread.
#[derive(Debug, thiserror::Error)]
pub enum ThreadError {
    #[error("Could not build thread bundle: {0}")]
    Bundle(#[from] BundleError),

    #[error("Failed to spawn thread program: {0}")]
    Spawn(std::io::Error),

    #[error("Protocol violation: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Failed reading thread output: {0}")]
    Read(#[from] LinesCodecError),

    #[error("Output closed before end")]
    EarlyClose,

    #[error("Thread exceeded {0:?}")]
    Timeout(Duration),

    #[error("Candidate sink write failed: {0}")]
    Sink(sqlx::Error),
}
