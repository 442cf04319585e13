//! Line protocol spoken by generation threads on stdout.
//!
//! ```text
//! svg,<id>,<base64 svg>
//! score,<id>,<score>,<total>
//! end
//! ```
//!
//! One event per line. Anything else is a protocol violation that fails the
//! thread. stderr is free-form diagnostics and never parsed.

use std::fmt;

use base64::prelude::{Engine, BASE64_STANDARD};

/// Upper bound on one protocol line; a base64 SVG comfortably fits.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

const TAG_SVG: &str = "svg";
const TAG_SCORE: &str = "score";
const TAG_END: &str = "end";

/// One decoded protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadEvent {
    /// A new candidate; `svg` is the decoded document.
    Svg { id: String, svg: String },
    /// Running tournament result for a previously emitted candidate.
    Score { id: String, score: i32, total: i32 },
    /// The thread is done; nothing follows.
    End,
}

impl ThreadEvent {
    /// Parse one line (without its trailing newline).
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim_end_matches('\r');
        let mut parts = line.split(',');
        match parts.next() {
            Some(TAG_END) if line == TAG_END => Ok(Self::End),
            Some(TAG_SVG) => {
                let (Some(id), Some(payload), None) = (parts.next(), parts.next(), parts.next())
                else {
                    return Err(ProtocolError::malformed(TAG_SVG, "expected 2 fields"));
                };
                let id = non_empty_id(TAG_SVG, id)?;
                let bytes = BASE64_STANDARD
                    .decode(payload)
                    .map_err(|e| ProtocolError::malformed(TAG_SVG, e.to_string()))?;
                let svg = String::from_utf8(bytes)
                    .map_err(|e| ProtocolError::malformed(TAG_SVG, e.to_string()))?;
                Ok(Self::Svg { id, svg })
            }
            Some(TAG_SCORE) => {
                let (Some(id), Some(score), Some(total), None) =
                    (parts.next(), parts.next(), parts.next(), parts.next())
                else {
                    return Err(ProtocolError::malformed(TAG_SCORE, "expected 3 fields"));
                };
                let id = non_empty_id(TAG_SCORE, id)?;
                let score = parse_count(score)?;
                let total = parse_count(total)?;
                if score > total {
                    return Err(ProtocolError::malformed(
                        TAG_SCORE,
                        format!("score {score} exceeds total {total}"),
                    ));
                }
                Ok(Self::Score { id, score, total })
            }
            _ => Err(ProtocolError::UnknownLine(truncate(line))),
        }
    }
}

impl fmt::Display for ThreadEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Svg { id, svg } => {
                write!(f, "{TAG_SVG},{id},{}", BASE64_STANDARD.encode(svg.as_bytes()))
            }
            Self::Score { id, score, total } => write!(f, "{TAG_SCORE},{id},{score},{total}"),
            Self::End => f.write_str(TAG_END),
        }
    }
}

fn non_empty_id(kind: &'static str, id: &str) -> Result<String, ProtocolError> {
    if id.is_empty() {
        return Err(ProtocolError::malformed(kind, "empty candidate id"));
    }
    Ok(id.to_string())
}

fn parse_count(value: &str) -> Result<i32, ProtocolError> {
    value
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|n| *n >= 0)
        .ok_or_else(|| ProtocolError::malformed(TAG_SCORE, format!("bad count {value:?}")))
}

/// Keep violation messages readable when a thread dumps a huge line.
fn truncate(line: &str) -> String {
    const PREVIEW: usize = 120;
    match line.char_indices().nth(PREVIEW) {
        Some((idx, _)) => format!("{}...", &line[..idx]),
        None => line.to_string(),
    }
}

/// A line that is not part of the protocol.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Unrecognized line: {0}")]
    UnknownLine(String),

    #[error("Malformed {kind} line: {reason}")]
    Malformed { kind: &'static str, reason: String },
}

impl ProtocolError {
    fn malformed(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            kind,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_svg_line() {
        let line = format!("svg,abc,{}", BASE64_STANDARD.encode("<svg></svg>"));
        assert_eq!(
            ThreadEvent::parse(&line).unwrap(),
            ThreadEvent::Svg { id: "abc".into(), svg: "<svg></svg>".into() }
        );
    }

    #[test]
    fn svg_display_is_parseable() {
        let event = ThreadEvent::Svg {
            id: "0190c".into(),
            svg: "<svg width=\"350\">Jane, Doe &amp; Co</svg>".into(),
        };
        let line = event.to_string();
        assert_eq!(line.matches(',').count(), 2, "payload must not add separators");
        assert_eq!(ThreadEvent::parse(&line).unwrap(), event);
    }

    #[test]
    fn parse_score_and_end() {
        assert_eq!(
            ThreadEvent::parse("score,abc,2,3").unwrap(),
            ThreadEvent::Score { id: "abc".into(), score: 2, total: 3 }
        );
        assert_eq!(ThreadEvent::parse("end").unwrap(), ThreadEvent::End);
        assert_eq!(ThreadEvent::parse("end\r").unwrap(), ThreadEvent::End);
    }

    #[test]
    fn unknown_lines_rejected() {
        assert_matches!(ThreadEvent::parse("hello"), Err(ProtocolError::UnknownLine(_)));
        assert_matches!(ThreadEvent::parse(""), Err(ProtocolError::UnknownLine(_)));
        assert_matches!(ThreadEvent::parse("end,extra"), Err(ProtocolError::UnknownLine(_)));
    }

    #[test]
    fn malformed_lines_rejected() {
        assert_matches!(
            ThreadEvent::parse("svg,abc"),
            Err(ProtocolError::Malformed { kind: "svg", .. })
        );
        assert_matches!(
            ThreadEvent::parse("svg,abc,@@@"),
            Err(ProtocolError::Malformed { kind: "svg", .. })
        );
        assert_matches!(
            ThreadEvent::parse("score,abc,x,1"),
            Err(ProtocolError::Malformed { kind: "score", .. })
        );
        assert_matches!(
            ThreadEvent::parse("score,abc,3,2"),
            Err(ProtocolError::Malformed { kind: "score", .. })
        );
    }

    #[test]
    fn long_unknown_line_is_truncated() {
        let err = ThreadEvent::parse(&"z".repeat(10_000)).unwrap_err();
        assert!(err.to_string().len() < 200);
    }
}
