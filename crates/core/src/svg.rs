//! SVG extraction and the structural overflow check.
//!
//! Model replies wrap the document in prose or code fences, so
//! [`extract_svg`] cuts out the first `<svg>...</svg>`. [`check_layout`] is a
//! cheap stand-in for rendering: it estimates each `<text>` element's box
//! and flags any that crosses the safety margin inside the card edge.

use std::sync::LazyLock;

use regex::Regex;

/// Minimum distance, in SVG units, between text and the card edge.
pub const EDGE_MARGIN: f64 = 7.0;

/// Used when a `<text>` element has no `font-size`.
const DEFAULT_FONT_SIZE: f64 = 16.0;

/// Average glyph advance as a fraction of the font size.
const GLYPH_WIDTH_RATIO: f64 = 0.6;

/// Share of the font size above the baseline.
const ASCENT_RATIO: f64 = 0.8;

/// Share of the font size below the baseline.
const DESCENT_RATIO: f64 = 0.2;

const SVG_OPEN: &str = "<svg";
const SVG_CLOSE: &str = "</svg>";

static TEXT_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<text\b([^>]*)>(.*?)</text>").expect("valid regex"));
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([a-zA-Z:-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
});
static INNER_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&[a-zA-Z#0-9]+;").expect("valid regex"));
static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(-?\d+(?:\.\d+)?)").expect("valid regex"));

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Cut the first SVG document out of a model reply.
///
/// Literal `\n` escape sequences are dropped, and bare ampersands are
/// escaped unless the document already uses `&amp;`. Returns `None` when no
/// complete document is present.
pub fn extract_svg(reply: &str) -> Option<String> {
    let text = reply.replace("\\n", "");
    let start = text.find(SVG_OPEN)?;
    let end = text[start..].find(SVG_CLOSE)? + start + SVG_CLOSE.len();
    let svg = &text[start..end];
    if svg.contains("&amp;") {
        Some(svg.to_string())
    } else {
        Some(svg.replace('&', "&amp;"))
    }
}

// ---------------------------------------------------------------------------
// Overflow check
// ---------------------------------------------------------------------------

/// Card edge a text element crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

/// Result of [`check_layout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutCheck {
    Fits,
    Overflow(Edge),
}

impl LayoutCheck {
    pub fn is_valid(self) -> bool {
        self == Self::Fits
    }
}

/// Estimate whether every `<text>` element stays inside the margin of a
/// `width` x `height` card.
pub fn check_layout(svg: &str, (width, height): (u32, u32)) -> LayoutCheck {
    let (width, height) = (f64::from(width), f64::from(height));

    for element in TEXT_ELEMENT.captures_iter(svg) {
        let attrs = &element[1];
        let stripped = INNER_TAG.replace_all(&element[2], "");
        let content = ENTITY.replace_all(&stripped, "&");
        let chars = content.trim().chars().count() as f64;
        if chars == 0.0 {
            continue;
        }

        let x = number_attr(attrs, "x").unwrap_or(0.0);
        let y = number_attr(attrs, "y").unwrap_or(0.0);
        let size = number_attr(attrs, "font-size").unwrap_or(DEFAULT_FONT_SIZE);
        let advance = GLYPH_WIDTH_RATIO * size * chars;

        let (left, right) = match attr(attrs, "text-anchor").as_deref() {
            Some("middle") => (x - advance / 2.0, x + advance / 2.0),
            Some("end") => (x - advance, x),
            _ => (x, x + advance),
        };
        let top = y - ASCENT_RATIO * size;
        let bottom = y + DESCENT_RATIO * size;

        if left < EDGE_MARGIN {
            return LayoutCheck::Overflow(Edge::Left);
        }
        if right > width - EDGE_MARGIN {
            return LayoutCheck::Overflow(Edge::Right);
        }
        if top < EDGE_MARGIN {
            return LayoutCheck::Overflow(Edge::Top);
        }
        if bottom > height - EDGE_MARGIN {
            return LayoutCheck::Overflow(Edge::Bottom);
        }
    }

    LayoutCheck::Fits
}

fn attr(attrs: &str, name: &str) -> Option<String> {
    ATTRIBUTE
        .captures_iter(attrs)
        .find(|c| c[1].eq_ignore_ascii_case(name))
        .and_then(|c| c.get(2).or_else(|| c.get(3)))
        .map(|value| value.as_str().trim().to_string())
}

fn number_attr(attrs: &str, name: &str) -> Option<f64> {
    let value = attr(attrs, name)?;
    LEADING_NUMBER
        .captures(&value)
        .and_then(|c| c[1].parse().ok())
}
