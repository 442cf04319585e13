//! Repository for the `text_renders` table (the candidate sink).

use sqlx::PgPool;

use crate::models::render::{CreateRender, TextRender};

/// Column list for `text_renders` queries.
const COLUMNS: &str = "id, user_id, batch_id, thread, created, score, total, svg";

/// Provides insert, scoring, and listing of candidate layouts.
pub struct RenderRepo;

impl RenderRepo {
    /// Persist a new candidate with zero score.
    ///
    /// A thread re-run after a lease takeover may repeat an id; the repeat is
    /// ignored. Returns `false` in that case.
    pub async fn insert(pool: &PgPool, input: &CreateRender) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO text_renders (id, user_id, batch_id, thread, svg) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(&input.id)
        .bind(&input.user_id)
        .bind(&input.batch_id)
        .bind(&input.thread)
        .bind(&input.svg)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Overwrite the running tournament result of a candidate.
    ///
    /// Returns `false` if no such candidate exists.
    pub async fn update_score(
        pool: &PgPool,
        id: &str,
        score: i32,
        total: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE text_renders SET score = $2, total = $3 WHERE id = $1")
            .bind(id)
            .bind(score)
            .bind(total)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Candidates of a batch in arrival order.
    pub async fn list_by_batch(pool: &PgPool, batch_id: &str) -> Result<Vec<TextRender>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM text_renders WHERE batch_id = $1 ORDER BY created ASC, id ASC"
        );
        sqlx::query_as::<_, TextRender>(&query)
            .bind(batch_id)
            .fetch_all(pool)
            .await
    }

    /// Candidates of a batch, best first: by win ratio, then wins, then age.
    pub async fn list_ranked(pool: &PgPool, batch_id: &str) -> Result<Vec<TextRender>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM text_renders WHERE batch_id = $1 \
             ORDER BY score::float8 / GREATEST(total, 1) DESC, score DESC, created ASC, id ASC"
        );
        sqlx::query_as::<_, TextRender>(&query)
            .bind(batch_id)
            .fetch_all(pool)
            .await
    }
}
