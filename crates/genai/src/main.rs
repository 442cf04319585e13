//! `cardsmith-genai` -- one generation thread.
//!
//! Usage: `cardsmith-genai <bundle>` where `<bundle>` is the base64 JSON
//! thread bundle. stdout carries protocol lines only; logs go to stderr.
//!
//! Exit status is 0 after `end` was written, 1 on any failure (including
//! the wall-clock budget), 2 on a missing argument.
//!
//! # Environment variables
//!
//! See [`GenAiConfig::from_env`].

use cardsmith_core::bundle::ThreadBundle;
use cardsmith_genai::client::GenAiClient;
use cardsmith_genai::config::GenAiConfig;
use cardsmith_genai::designer::ModelDesigner;
use cardsmith_genai::emit::Emitter;
use cardsmith_genai::error::GenAiError;
use cardsmith_genai::judge::ModelJudge;
use cardsmith_genai::session::{Session, SessionSummary};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cardsmith_genai=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(arg) = std::env::args().nth(1) else {
        tracing::error!("Usage: cardsmith-genai <bundle>");
        std::process::exit(2);
    };

    match run(&arg).await {
        Ok(summary) => {
            tracing::info!(
                candidates = summary.candidates,
                stopped_early = summary.stopped_early,
                "Thread finished",
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Thread failed");
            std::process::exit(1);
        }
    }
}

async fn run(arg: &str) -> Result<SessionSummary, GenAiError> {
    let config = GenAiConfig::from_env()?;
    let bundle = ThreadBundle::decode(arg)?;
    tracing::info!(
        thread = %bundle.thread,
        dimens = ?bundle.layout_orientation(),
        align = ?bundle.align,
        lines = bundle.texts.len(),
        "Starting thread",
    );

    let client = GenAiClient::new(config.base_url.clone(), config.api_key.clone());
    let designer = ModelDesigner::new(client.clone(), &config);
    let judge = ModelJudge::new(client, &config);

    let (emitter, writer) = Emitter::spawn(tokio::io::stdout());
    let session = Session::new(designer, judge, &bundle, config.rounds, emitter);

    let summary = tokio::time::timeout(config.thread_timeout, session.run(&bundle))
        .await
        .map_err(|_| GenAiError::Timeout(config.thread_timeout))??;

    // Every emitter is gone once the session returns; wait for the flush.
    writer.await??;
    Ok(summary)
}
