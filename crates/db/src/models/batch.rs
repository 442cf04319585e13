//! Generation batch rows (`text_batches`).

use cardsmith_core::bundle::{BundleError, Orientation};
use cardsmith_core::error::CoreError;
use cardsmith_core::texts::{restore_order, OrderedTexts};
use cardsmith_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Separator of the `fonts` column.
pub const FONT_SEPARATOR: char = ',';

/// A row from the `text_batches` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TextBatch {
    pub id: DbId,
    pub user_id: DbId,
    pub created: Timestamp,
    /// Owner tag of the coordinator holding the lease.
    pub worker: Option<String>,
    /// Last heartbeat of the owner.
    pub worker_alive: Option<Timestamp>,
    pub is_ready: bool,
    pub is_front: bool,
    /// Processing time in milliseconds, written on completion.
    pub timems: Option<i32>,
    pub dimens: String,
    /// Text fields plus a `sorted` array naming their order.
    pub texts: serde_json::Value,
    /// Comma-separated font display names.
    pub fonts: String,
}

impl TextBatch {
    /// Font names in the order the producer listed them, blanks dropped.
    pub fn font_names(&self) -> Vec<&str> {
        self.fonts
            .split(FONT_SEPARATOR)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }

    pub fn orientation(&self) -> Result<Orientation, BundleError> {
        Orientation::parse(&self.dimens)
    }

    /// Text fields with their original order restored.
    pub fn ordered_texts(&self) -> Result<OrderedTexts, CoreError> {
        restore_order(&self.texts)
    }
}

/// DTO for enqueueing a batch.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitBatch {
    pub user_id: DbId,
    pub texts: serde_json::Value,
    pub fonts: Vec<String>,
    pub dimens: Orientation,
    pub is_front: bool,
    /// Override of the creation time; defaults to `NOW()`.
    #[serde(default)]
    pub created: Option<Timestamp>,
}

impl SubmitBatch {
    /// The `fonts` column value.
    pub fn fonts_column(&self) -> String {
        self.fonts.join(&FONT_SEPARATOR.to_string())
    }

    /// The `dimens` column value.
    pub fn dimens_column(&self) -> &'static str {
        match self.dimens {
            Orientation::Wide => "wide",
            Orientation::Tall => "tall",
        }
    }
}
