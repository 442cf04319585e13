//! Integration tests for candidate persistence and the font catalogue.

use cardsmith_core::bundle::{FontRef, Orientation};
use cardsmith_db::models::batch::SubmitBatch;
use cardsmith_db::models::font::UpsertFont;
use cardsmith_db::models::render::CreateRender;
use cardsmith_db::repositories::{BatchRepo, FontRepo, RenderRepo};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn batch_id(pool: &PgPool) -> String {
    let input = SubmitBatch {
        user_id: "user-1".to_string(),
        texts: json!({"name": "Jane Doe"}),
        fonts: vec!["Bungee".to_string()],
        dimens: Orientation::Tall,
        is_front: false,
        created: None,
    };
    BatchRepo::submit(pool, &input).await.unwrap().id
}

fn new_render(batch_id: &str, id: &str) -> CreateRender {
    CreateRender {
        id: id.to_string(),
        user_id: "user-1".to_string(),
        batch_id: batch_id.to_string(),
        thread: "t1a2b3".to_string(),
        svg: format!("<svg><text>{id}</text></svg>"),
    }
}

fn new_font(name: &str, key: &str) -> UpsertFont {
    UpsertFont {
        name: name.to_string(),
        sort: None,
        filename: format!("{name}.ttf"),
        key: key.to_string(),
        tags: None,
    }
}

// ---------------------------------------------------------------------------
// Renders
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_insert_and_list_in_arrival_order(pool: PgPool) {
    let batch = batch_id(&pool).await;
    for id in ["r1", "r2", "r3"] {
        assert!(RenderRepo::insert(&pool, &new_render(&batch, id)).await.unwrap());
    }

    let renders = RenderRepo::list_by_batch(&pool, &batch).await.unwrap();
    let ids: Vec<_> = renders.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["r1", "r2", "r3"]);
    assert!(renders.iter().all(|r| r.score == 0 && r.total == 0));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_insert_is_ignored(pool: PgPool) {
    let batch = batch_id(&pool).await;
    assert!(RenderRepo::insert(&pool, &new_render(&batch, "r1")).await.unwrap());
    assert!(!RenderRepo::insert(&pool, &new_render(&batch, "r1")).await.unwrap());
    assert_eq!(RenderRepo::list_by_batch(&pool, &batch).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_insert_for_unknown_batch_fails(pool: PgPool) {
    let result = RenderRepo::insert(&pool, &new_render("no-such-batch", "r1")).await;
    assert!(result.is_err());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_score_updates_and_ranking(pool: PgPool) {
    let batch = batch_id(&pool).await;
    for id in ["r1", "r2", "r3"] {
        RenderRepo::insert(&pool, &new_render(&batch, id)).await.unwrap();
    }
    RenderRepo::update_score(&pool, "r1", 0, 2).await.unwrap();
    RenderRepo::update_score(&pool, "r2", 2, 2).await.unwrap();
    RenderRepo::update_score(&pool, "r3", 1, 2).await.unwrap();
    assert!(!RenderRepo::update_score(&pool, "missing", 1, 1).await.unwrap());

    let ranked = RenderRepo::list_ranked(&pool, &batch).await.unwrap();
    let ids: Vec<_> = ranked.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["r2", "r3", "r1"]);
    assert_eq!(ranked[0].win_ratio(), 1.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_score_above_total_rejected(pool: PgPool) {
    let batch = batch_id(&pool).await;
    RenderRepo::insert(&pool, &new_render(&batch, "r1")).await.unwrap();
    assert!(RenderRepo::update_score(&pool, "r1", 3, 2).await.is_err());
}

// ---------------------------------------------------------------------------
// Fonts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_font_upsert_and_lookup(pool: PgPool) {
    FontRepo::upsert(&pool, &new_font("Bungee", "fonts/v1/Bungee.ttf")).await.unwrap();
    let updated = FontRepo::upsert(&pool, &new_font("Bungee", "fonts/v2/Bungee.ttf"))
        .await
        .unwrap();
    assert_eq!(updated.key, "fonts/v2/Bungee.ttf");

    let found = FontRepo::find_by_name(&pool, "Bungee").await.unwrap().unwrap();
    assert_eq!(
        FontRef::from(&found),
        FontRef { name: "Bungee".into(), key: "fonts/v2/Bungee.ttf".into() }
    );
    assert!(FontRepo::find_by_name(&pool, "Missing").await.unwrap().is_none());
    assert_eq!(FontRepo::list(&pool).await.unwrap().len(), 1);
}
