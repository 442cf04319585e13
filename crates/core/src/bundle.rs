//! The single argument handed to every generation thread.
//!
//! A [`ThreadBundle`] is serialized to JSON and base64-encoded so it travels
//! as one opaque process argument. The encoded form is capped at
//! [`MAX_BUNDLE_BYTES`] to stay well under the kernel's per-argument limit.

use base64::prelude::{Engine, BASE64_STANDARD};
use serde::{Deserialize, Serialize};

use crate::texts::OrderedTexts;

/// Upper bound on the encoded bundle (Linux caps one argument at 128 KiB).
pub const MAX_BUNDLE_BYTES: usize = 96 * 1024;

/// Alignment hints assigned to threads in launch order.
pub const THREAD_ALIGNMENTS: [Alignment; 4] = [
    Alignment::Left,
    Alignment::Left,
    Alignment::Center,
    Alignment::Center,
];

// ---------------------------------------------------------------------------
// Value types
// ---------------------------------------------------------------------------

/// Card orientation as stored in `text_batches.dimens`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Wide,
    Tall,
}

impl Orientation {
    /// Parse the `dimens` column value.
    pub fn parse(value: &str) -> Result<Self, BundleError> {
        match value {
            "wide" => Ok(Self::Wide),
            "tall" => Ok(Self::Tall),
            other => Err(BundleError::Orientation(other.to_string())),
        }
    }

    /// Canvas size in SVG user units as `(width, height)`.
    pub fn canvas(self) -> (u32, u32) {
        match self {
            Self::Wide => (350, 200),
            Self::Tall => (200, 350),
        }
    }
}

/// Horizontal alignment hint for one generation thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
}

/// Alignment for the thread at `index`, cycling through [`THREAD_ALIGNMENTS`].
pub fn alignment_for_thread(index: usize) -> Alignment {
    THREAD_ALIGNMENTS[index % THREAD_ALIGNMENTS.len()]
}

/// A font resolved from its display name to its object-store key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontRef {
    pub name: String,
    pub key: String,
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// Everything a generation thread needs to lay out one card face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadBundle {
    /// Correlation tag used in logs and stored on every candidate row.
    pub thread: String,
    pub dimens: Orientation,
    pub front: bool,
    pub texts: OrderedTexts,
    pub fonts: Vec<FontRef>,
    pub align: Alignment,
}

impl ThreadBundle {
    /// Orientation the layout is actually generated in.
    ///
    /// The back of a tall card is printed sideways, so it is laid out wide.
    pub fn layout_orientation(&self) -> Orientation {
        if !self.front && self.dimens == Orientation::Tall {
            Orientation::Wide
        } else {
            self.dimens
        }
    }

    /// Whether the layout should be centered regardless of the hint.
    ///
    /// A single line of text always reads best centered.
    pub fn centered(&self) -> bool {
        self.align == Alignment::Center || self.texts.len() <= 1
    }

    /// Serialize and base64-encode for use as a process argument.
    pub fn encode(&self) -> Result<String, BundleError> {
        let json = serde_json::to_vec(self).map_err(BundleError::Json)?;
        let encoded = BASE64_STANDARD.encode(json);
        if encoded.len() > MAX_BUNDLE_BYTES {
            return Err(BundleError::TooLarge {
                size: encoded.len(),
                max: MAX_BUNDLE_BYTES,
            });
        }
        Ok(encoded)
    }

    /// Decode an argument produced by [`encode`](Self::encode).
    pub fn decode(arg: &str) -> Result<Self, BundleError> {
        if arg.len() > MAX_BUNDLE_BYTES {
            return Err(BundleError::TooLarge {
                size: arg.len(),
                max: MAX_BUNDLE_BYTES,
            });
        }
        let json = BASE64_STANDARD.decode(arg.trim()).map_err(BundleError::Base64)?;
        serde_json::from_slice(&json).map_err(BundleError::Json)
    }
}

/// Errors building or reading a [`ThreadBundle`].
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("Unknown card orientation: {0}")]
    Orientation(String),

    #[error("Bundle is {size} bytes, limit is {max}")]
    TooLarge { size: usize, max: usize },

    #[error("Bundle is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Bundle JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
