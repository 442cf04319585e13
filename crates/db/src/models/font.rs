//! Font catalogue rows (`fonts`).

use cardsmith_core::bundle::FontRef;
use cardsmith_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `fonts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Font {
    pub name: String,
    pub sort: i32,
    pub created: Timestamp,
    pub filename: String,
    /// Object-store key of the font file.
    pub key: String,
    pub tags: String,
}

impl From<&Font> for FontRef {
    fn from(font: &Font) -> Self {
        FontRef {
            name: font.name.clone(),
            key: font.key.clone(),
        }
    }
}

/// DTO for registering or replacing a font.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertFont {
    pub name: String,
    pub sort: Option<i32>,
    pub filename: String,
    pub key: String,
    pub tags: Option<String>,
}
