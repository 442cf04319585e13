//! Error type for the generation thread.

use cardsmith_core::bundle::BundleError;
use cardsmith_core::hedge::Transient;

/// HTTP status the generative backend answers with when overloaded.
pub const OVERLOADED_STATUS: u16 = 503;

/// Errors from backend calls and the thread's own plumbing.
#[derive(Debug, thiserror::Error)]
pub enum GenAiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend is temporarily overloaded (HTTP 503).
    #[error("Model overloaded: {0}")]
    Overloaded(String),

    /// The backend returned any other non-2xx status.
    #[error("Model API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// A 2xx reply that does not match the expected shape.
    #[error("Unexpected model reply: {0}")]
    Decode(String),

    #[error("Invalid bundle: {0}")]
    Bundle(#[from] BundleError),

    /// stdout is gone, so nothing more can be reported.
    #[error("Output channel closed")]
    OutputClosed,

    #[error("Thread exceeded its {0:?} budget")]
    Timeout(std::time::Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Transient for GenAiError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Overloaded(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_overload_is_transient() {
        assert!(GenAiError::Overloaded("busy".into()).is_transient());
        assert!(!GenAiError::Api { status: 500, body: String::new() }.is_transient());
        assert!(!GenAiError::Decode("x".into()).is_transient());
    }

    #[test]
    fn display_api_error() {
        let err = GenAiError::Api { status: 400, body: "bad key".into() };
        assert_eq!(err.to_string(), "Model API error (400): bad key");
    }
}
