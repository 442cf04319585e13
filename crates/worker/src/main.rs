//! `cardsmith-worker` -- one coordinator process.
//!
//! # Environment variables
//!
//! See [`WorkerConfig::from_env`].

use cardsmith_core::lease::new_tag;
use cardsmith_worker::config::WorkerConfig;
use cardsmith_worker::coordinator::Coordinator;
use cardsmith_worker::error::WorkerError;
use cardsmith_worker::pipeline::Pipeline;
use cardsmith_worker::sink::PgCandidateSink;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cardsmith_worker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Coordinator failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), WorkerError> {
    let config = WorkerConfig::from_env()?;

    if !config.startup_delay.is_zero() {
        tracing::info!(delay_secs = config.startup_delay.as_secs(), "Delaying startup");
        tokio::time::sleep(config.startup_delay).await;
    }

    let pool = cardsmith_db::create_pool(&config.database_url, config.db_max_connections).await?;
    cardsmith_db::health_check(&pool).await?;
    tracing::info!("Database connection established");

    if config.run_migrations {
        cardsmith_db::run_migrations(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let pipeline = Pipeline::new(
        pool.clone(),
        PgCandidateSink::new(pool.clone()),
        config.threads,
        config.thread.clone(),
    );
    let coordinator = Coordinator::new(
        pool,
        new_tag(),
        config.lease,
        config.poll_interval,
        config.heartbeat_interval,
        pipeline,
    );
    tracing::info!(
        worker = %coordinator.worker(),
        program = %config.thread.program,
        threads = config.threads,
        "Worker starting",
    );

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            on_signal.cancel();
        }
    });

    coordinator.run(cancel).await
}
