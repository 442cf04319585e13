//! Generation thread configuration loaded from environment variables.

use std::time::Duration;

use crate::error::GenAiError;

/// Default generative backend endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model for drafting layouts.
pub const DEFAULT_DRAFT_MODEL: &str = "gemini-2.5-flash-lite";

/// Default model for critiquing a draft.
pub const DEFAULT_CRITIQUE_MODEL: &str = "gemini-2.5-flash-lite";

/// Default model for pairwise judging.
pub const DEFAULT_JUDGE_MODEL: &str = "gemini-2.0-flash-lite";

/// Draft/critique rounds per thread; also the tournament slot count.
pub const DEFAULT_ROUNDS: usize = 4;

/// Whole-thread wall-clock budget.
pub const DEFAULT_THREAD_TIMEOUT_SECS: u64 = 60;

/// Duplicate a draft call that has not answered after this long.
pub const DRAFT_HEDGE_AFTER: Duration = Duration::from_secs(5);

/// Duplicate a critique call that has not answered after this long.
pub const CRITIQUE_HEDGE_AFTER: Duration = Duration::from_secs(7);

/// Duplicate a judge call that has not answered after this long.
pub const JUDGE_HEDGE_AFTER: Duration = Duration::from_secs(5);

/// Settings of one generation thread process.
#[derive(Debug, Clone)]
pub struct GenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub draft_model: String,
    pub critique_model: String,
    pub judge_model: String,
    pub rounds: usize,
    pub thread_timeout: Duration,
}

impl GenAiConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var               | Default                                     |
    /// |-----------------------|---------------------------------------------|
    /// | `GEMINI_API_KEY`      | required                                    |
    /// | `GENAI_BASE_URL`      | `https://generativelanguage.googleapis.com` |
    /// | `GENAI_MODEL_DRAFT`   | `gemini-2.5-flash-lite`                     |
    /// | `GENAI_MODEL_CRITIQUE`| `gemini-2.5-flash-lite`                     |
    /// | `GENAI_MODEL_JUDGE`   | `gemini-2.0-flash-lite`                     |
    /// | `GENAI_ROUNDS`        | `4`                                         |
    /// | `THREAD_TIMEOUT_SECS` | `60`                                        |
    pub fn from_env() -> Result<Self, GenAiError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GenAiError> {
        let api_key = lookup("GEMINI_API_KEY")
            .filter(|key| !key.is_empty())
            .ok_or_else(|| GenAiError::Config("GEMINI_API_KEY must be set".into()))?;

        let text = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let rounds: usize = parse(&lookup, "GENAI_ROUNDS", DEFAULT_ROUNDS)?;
        if rounds == 0 {
            return Err(GenAiError::Config("GENAI_ROUNDS must be at least 1".into()));
        }
        let timeout_secs: u64 = parse(&lookup, "THREAD_TIMEOUT_SECS", DEFAULT_THREAD_TIMEOUT_SECS)?;

        Ok(Self {
            api_key,
            base_url: text("GENAI_BASE_URL", DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            draft_model: text("GENAI_MODEL_DRAFT", DEFAULT_DRAFT_MODEL),
            critique_model: text("GENAI_MODEL_CRITIQUE", DEFAULT_CRITIQUE_MODEL),
            judge_model: text("GENAI_MODEL_JUDGE", DEFAULT_JUDGE_MODEL),
            rounds,
            thread_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, GenAiError> {
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| GenAiError::Config(format!("{name} must be a number, got {raw:?}"))),
    }
}
