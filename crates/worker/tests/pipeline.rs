//! Batch fan-out and the coordinator loop against a real database.

mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use cardsmith_core::bundle::Orientation;
use cardsmith_core::lease::LeasePolicy;
use cardsmith_db::models::batch::{SubmitBatch, TextBatch};
use cardsmith_db::models::font::UpsertFont;
use cardsmith_db::repositories::{BatchRepo, FontRepo, RenderRepo};
use cardsmith_worker::coordinator::Coordinator;
use cardsmith_worker::error::WorkerError;
use cardsmith_worker::pipeline::Pipeline;
use cardsmith_worker::sink::PgCandidateSink;
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use common::{thread_config, write_script};

/// Emits two scored candidates named after the thread tag, except on
/// center-aligned threads, which exit without `end`.
const LEFT_ONLY: &str = r#"bundle=$(echo "$1" | base64 -d)
echo "$bundle" | grep -q '"align":"center"' && exit 1
tag=$(echo "$bundle" | grep -o '"thread":"[0-9a-f]*"' | cut -d'"' -f4)
echo "svg,$tag-a,PHN2Zy8+"
echo "svg,$tag-b,PHN2Zy8+"
echo "score,$tag-a,1,1"
echo "score,$tag-b,0,1"
echo end
"#;

const TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_font(pool: &PgPool) {
    FontRepo::upsert(
        pool,
        &UpsertFont {
            name: "Bungee".to_string(),
            sort: None,
            filename: "Bungee-Regular.ttf".to_string(),
            key: "fonts/bungee.ttf".to_string(),
            tags: None,
        },
    )
    .await
    .unwrap();
}

async fn submit(pool: &PgPool, fonts: &[&str]) -> String {
    let input = SubmitBatch {
        user_id: "user-1".to_string(),
        texts: json!({"title": "Baker", "name": "Jane Doe", "sorted": ["name", "title"]}),
        fonts: fonts.iter().map(|f| f.to_string()).collect(),
        dimens: Orientation::Wide,
        is_front: true,
        created: None,
    };
    BatchRepo::submit(pool, &input).await.unwrap().id
}

async fn claim_one(pool: &PgPool) -> TextBatch {
    let mut claimed = BatchRepo::claim(pool, "abc123", &LeasePolicy::default(), Utc::now())
        .await
        .unwrap();
    assert_eq!(claimed.len(), 1);
    claimed.remove(0)
}

fn pipeline(pool: &PgPool, script: &tempfile::NamedTempFile) -> Pipeline<PgCandidateSink> {
    Pipeline::new(
        pool.clone(),
        PgCandidateSink::new(pool.clone()),
        4,
        thread_config(script, TIMEOUT),
    )
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_threads_do_not_block_ready(pool: PgPool) {
    seed_font(&pool).await;
    let id = submit(&pool, &["Bungee"]).await;
    let batch = claim_one(&pool).await;
    let script = write_script(LEFT_ONLY);

    let report = pipeline(&pool, &script).run_batch(&batch).await.unwrap();

    assert_eq!(report.batch_id, id);
    assert_eq!(report.threads, 4);
    assert_eq!(report.failed_threads, 2);
    assert_eq!(report.candidates, 4);

    let stored = BatchRepo::find_by_id(&pool, &id).await.unwrap().unwrap();
    assert!(stored.is_ready);
    assert_eq!(stored.worker, None);
    assert_eq!(stored.worker_alive, None);
    assert!(stored.timems.is_some());

    let renders = RenderRepo::list_ranked(&pool, &id).await.unwrap();
    assert_eq!(renders.len(), 4);
    assert_eq!(renders.iter().filter(|r| r.score == 1).count(), 2);
    assert!(renders.iter().all(|r| r.total == 1 && r.batch_id == id));
    assert_eq!(renders[0].score, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missing_font_releases_batch_without_threads(pool: PgPool) {
    seed_font(&pool).await;
    let id = submit(&pool, &["Bungee", "Nonexistent"]).await;
    let batch = claim_one(&pool).await;
    let script = write_script(LEFT_ONLY);

    let report = pipeline(&pool, &script).run_batch(&batch).await.unwrap();

    assert_eq!(report.threads, 0);
    assert_eq!(report.candidates, 0);
    let stored = BatchRepo::find_by_id(&pool, &id).await.unwrap().unwrap();
    assert!(stored.is_ready);
    assert!(RenderRepo::list_by_batch(&pool, &id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_every_thread_failing_still_releases(pool: PgPool) {
    seed_font(&pool).await;
    let id = submit(&pool, &["Bungee"]).await;
    let batch = claim_one(&pool).await;
    let script = write_script("echo garbage\n");

    let report = pipeline(&pool, &script).run_batch(&batch).await.unwrap();

    assert_eq!(report.failed_threads, 4);
    let stored = BatchRepo::find_by_id(&pool, &id).await.unwrap().unwrap();
    assert!(stored.is_ready);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_font_store_error_leaves_batch_unreleased(pool: PgPool) {
    let id = submit(&pool, &["Bungee"]).await;
    let batch = claim_one(&pool).await;
    sqlx::query("DROP TABLE fonts").execute(&pool).await.unwrap();
    let script = write_script(LEFT_ONLY);

    let result = pipeline(&pool, &script).run_batch(&batch).await;

    assert_matches!(result, Err(WorkerError::Database(_)));
    let stored = BatchRepo::find_by_id(&pool, &id).await.unwrap().unwrap();
    assert!(!stored.is_ready);
    assert_eq!(stored.worker.as_deref(), Some("abc123"));
    assert!(RenderRepo::list_by_batch(&pool, &id).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

fn coordinator(pool: &PgPool, script: &tempfile::NamedTempFile) -> Coordinator<PgCandidateSink> {
    Coordinator::new(
        pool.clone(),
        "coord1".to_string(),
        LeasePolicy::default(),
        Duration::from_millis(50),
        Duration::from_secs(15),
        pipeline(pool, script),
    )
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_coordinator_drains_queue(pool: PgPool) {
    seed_font(&pool).await;
    let first = submit(&pool, &["Bungee"]).await;
    let second = submit(&pool, &["Bungee"]).await;
    let script = write_script(LEFT_ONLY);

    let cancel = CancellationToken::new();
    let coordinator = coordinator(&pool, &script);
    let run = {
        let cancel = cancel.clone();
        tokio::spawn(async move { coordinator.run(cancel).await })
    };

    let deadline = tokio::time::Instant::now() + Duration::from_secs(20);
    while BatchRepo::count_pending(&pool).await.unwrap() > 0 {
        assert!(tokio::time::Instant::now() < deadline, "queue did not drain");
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    cancel.cancel();
    run.await.unwrap().unwrap();

    for id in [first, second] {
        assert_eq!(RenderRepo::list_by_batch(&pool, &id).await.unwrap().len(), 4);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_font_store_error_stops_coordinator(pool: PgPool) {
    let id = submit(&pool, &["Bungee"]).await;
    sqlx::query("DROP TABLE fonts").execute(&pool).await.unwrap();
    let script = write_script(LEFT_ONLY);
    let coordinator = coordinator(&pool, &script);

    let result = tokio::time::timeout(Duration::from_secs(10), coordinator.run(CancellationToken::new()))
        .await
        .expect("coordinator stops on its own");

    assert_matches!(result, Err(WorkerError::Database(_)));
    let stored = BatchRepo::find_by_id(&pool, &id).await.unwrap().unwrap();
    assert!(!stored.is_ready);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_store_failure_is_fatal(pool: PgPool) {
    let script = write_script(LEFT_ONLY);
    let coordinator = coordinator(&pool, &script);
    pool.close().await;

    let result = tokio::time::timeout(Duration::from_secs(10), coordinator.run(CancellationToken::new()))
        .await
        .expect("coordinator stops on its own");
    assert_matches!(result, Err(WorkerError::Database(_)));
}
