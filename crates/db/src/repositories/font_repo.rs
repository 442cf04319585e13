//! Repository for the `fonts` table.

use sqlx::PgPool;

use crate::models::font::{Font, UpsertFont};

/// Column list for `fonts` queries.
const COLUMNS: &str = "name, sort, created, filename, key, tags";

/// Provides lookup and registration of fonts.
pub struct FontRepo;

impl FontRepo {
    /// Find a font by its display name.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Font>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM fonts WHERE name = $1");
        sqlx::query_as::<_, Font>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Insert a font or replace the file details of an existing one.
    pub async fn upsert(pool: &PgPool, input: &UpsertFont) -> Result<Font, sqlx::Error> {
        let query = format!(
            "INSERT INTO fonts (name, sort, filename, key, tags) \
             VALUES ($1, COALESCE($2, 0), $3, $4, COALESCE($5, '')) \
             ON CONFLICT (name) DO UPDATE SET \
                 sort = COALESCE($2, fonts.sort), \
                 filename = EXCLUDED.filename, \
                 key = EXCLUDED.key, \
                 tags = COALESCE($5, fonts.tags) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Font>(&query)
            .bind(&input.name)
            .bind(input.sort)
            .bind(&input.filename)
            .bind(&input.key)
            .bind(input.tags.as_deref())
            .fetch_one(pool)
            .await
    }

    /// All fonts in catalogue order.
    pub async fn list(pool: &PgPool) -> Result<Vec<Font>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM fonts ORDER BY sort ASC, name ASC");
        sqlx::query_as::<_, Font>(&query).fetch_all(pool).await
    }
}
