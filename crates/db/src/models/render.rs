//! Candidate layout rows (`text_renders`).

use cardsmith_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `text_renders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TextRender {
    pub id: DbId,
    pub user_id: DbId,
    pub batch_id: DbId,
    /// Tag of the generation thread that produced the candidate.
    pub thread: String,
    pub created: Timestamp,
    /// Pairwise comparisons won.
    pub score: i32,
    /// Pairwise comparisons taken part in.
    pub total: i32,
    pub svg: String,
}

impl TextRender {
    /// Share of comparisons won; 0 for an unranked candidate.
    pub fn win_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.score) / f64::from(self.total)
        }
    }
}

/// DTO for persisting a candidate streamed by a thread.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRender {
    /// Candidate id assigned by the thread.
    pub id: DbId,
    pub user_id: DbId,
    pub batch_id: DbId,
    pub thread: String,
    pub svg: String,
}
