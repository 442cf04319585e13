//! Repository for the `text_batches` table.
//!
//! Besides plain CRUD this is the lease store. A lease is the
//! `(worker, worker_alive)` pair: claim stamps it, the heartbeat refreshes
//! it, and [`BatchRepo::mark_ready`] clears it. Claiming is serialized by an
//! exclusive table lock so two coordinators can never both see the same row
//! as free inside one claim.

use cardsmith_core::lease::LeasePolicy;
use cardsmith_core::types::{DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use crate::models::batch::{SubmitBatch, TextBatch};

/// Column list for `text_batches` queries.
const COLUMNS: &str = "\
    id, user_id, created, worker, worker_alive, is_ready, is_front, \
    timems, dimens, texts, fonts";

/// Provides lease and lifecycle operations for generation batches.
pub struct BatchRepo;

impl BatchRepo {
    /// Enqueue a new not-ready, unowned batch.
    pub async fn submit(pool: &PgPool, input: &SubmitBatch) -> Result<TextBatch, sqlx::Error> {
        let query = format!(
            "INSERT INTO text_batches (id, user_id, created, is_front, dimens, texts, fonts) \
             VALUES ($1, $2, COALESCE($3, NOW()), $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TextBatch>(&query)
            .bind(uuid::Uuid::now_v7().to_string())
            .bind(&input.user_id)
            .bind(input.created)
            .bind(input.is_front)
            .bind(input.dimens_column())
            .bind(&input.texts)
            .bind(input.fonts_column())
            .fetch_one(pool)
            .await
    }

    /// Claim up to `policy.claim_limit(active)` unclaimed or stale batches
    /// for `worker`, oldest first.
    ///
    /// Runs under `LOCK TABLE ... IN ACCESS EXCLUSIVE MODE`. Returns the rows
    /// as they were before stamping. Any error rolls the whole claim back.
    pub async fn claim(
        pool: &PgPool,
        worker: &str,
        policy: &LeasePolicy,
        now: Timestamp,
    ) -> Result<Vec<TextBatch>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("LOCK TABLE text_batches IN ACCESS EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let active = Self::count_active(&mut *tx, policy.active_since(now)).await?;

        let limit = policy.claim_limit(active);
        tracing::trace!(worker, active, limit, "Claim section");
        if limit == 0 {
            tx.commit().await?;
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT {COLUMNS} FROM text_batches \
             WHERE NOT is_ready AND (worker_alive IS NULL OR worker_alive <= $1) \
             ORDER BY created ASC, id ASC \
             LIMIT $2"
        );
        let batches = sqlx::query_as::<_, TextBatch>(&query)
            .bind(policy.stale_before(now))
            .bind(limit)
            .fetch_all(&mut *tx)
            .await?;

        if !batches.is_empty() {
            let ids: Vec<DbId> = batches.iter().map(|b| b.id.clone()).collect();
            sqlx::query(
                "UPDATE text_batches SET worker = $1, worker_alive = $2 \
                 WHERE id = ANY($3)",
            )
            .bind(worker)
            .bind(now)
            .bind(&ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(batches)
    }

    /// Refresh the heartbeat of every not-ready batch owned by `worker`.
    ///
    /// Returns the number of leases refreshed.
    pub async fn refresh_heartbeats(
        pool: &PgPool,
        worker: &str,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE text_batches SET worker_alive = $2 \
             WHERE worker = $1 AND NOT is_ready",
        )
        .bind(worker)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Queue depth: every batch not yet ready, owned or not.
    pub async fn count_pending(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM text_batches WHERE NOT is_ready")
            .fetch_one(pool)
            .await
    }

    /// Not-ready batches whose heartbeat is newer than `since`.
    ///
    /// Runs on a pool or inside the claim transaction.
    pub async fn count_active<'e, E>(executor: E, since: Timestamp) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM text_batches \
             WHERE NOT is_ready AND worker_alive > $1",
        )
        .bind(since)
        .fetch_one(executor)
        .await
    }

    /// Release a batch as ready: clear the lease and record processing time.
    ///
    /// Returns `false` if no such batch exists.
    pub async fn mark_ready(pool: &PgPool, id: &str, elapsed_ms: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE text_batches \
             SET is_ready = TRUE, worker = NULL, worker_alive = NULL, timems = $2 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(elapsed_ms)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find a batch by its ID.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<TextBatch>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM text_batches WHERE id = $1");
        sqlx::query_as::<_, TextBatch>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Number of unclaimed, not-ready batches created before this one.
    ///
    /// Returns `None` if the batch does not exist.
    pub async fn queue_position(pool: &PgPool, id: &str) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<i64>>(
            "SELECT ( \
                 SELECT COUNT(*) FROM text_batches q \
                 WHERE NOT q.is_ready AND q.worker IS NULL \
                   AND (q.created, q.id) < (b.created, b.id) \
             ) \
             FROM text_batches b WHERE b.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map(Option::flatten)
    }
}
