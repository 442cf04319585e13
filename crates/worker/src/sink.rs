//! Where streamed candidates and their scores are written.

use std::future::Future;

use cardsmith_db::models::render::CreateRender;
use cardsmith_db::repositories::RenderRepo;
use cardsmith_db::DbPool;

/// Destination of `svg` and `score` events.
pub trait CandidateSink: Send + Sync {
    /// Persist a new candidate. Returns `false` if the id already existed.
    fn insert(&self, render: &CreateRender) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;

    /// Overwrite the score of a candidate. Returns `false` if it is unknown.
    fn update_score(
        &self,
        id: &str,
        score: i32,
        total: i32,
    ) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;
}

/// [`CandidateSink`] writing to the `text_renders` table.
#[derive(Debug, Clone)]
pub struct PgCandidateSink {
    pool: DbPool,
}

impl PgCandidateSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CandidateSink for PgCandidateSink {
    async fn insert(&self, render: &CreateRender) -> Result<bool, sqlx::Error> {
        RenderRepo::insert(&self.pool, render).await
    }

    async fn update_score(&self, id: &str, score: i32, total: i32) -> Result<bool, sqlx::Error> {
        RenderRepo::update_score(&self.pool, id, score, total).await
    }
}
