//! Pairwise judging of two candidate layouts.

use std::future::Future;

use cardsmith_core::hedge::{hedged, HedgePolicy};

use crate::client::GenAiClient;
use crate::config::{GenAiConfig, JUDGE_HEDGE_AFTER};
use crate::error::GenAiError;
use crate::messages::{Content, GenerateRequest, GenerationConfig, Tool, ToolConfig};
use crate::prompts;

/// Which side of a pair won.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    First,
    Second,
}

impl Choice {
    /// Map the judge function's `best` argument.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "image_1" => Some(Self::First),
            "image_2" => Some(Self::Second),
            _ => None,
        }
    }
}

/// Compares two SVG candidates.
pub trait Judge: Send + Sync {
    /// `Ok(None)` when the judge gave no usable verdict; the pair is then
    /// discarded.
    fn compare(
        &self,
        first: &str,
        second: &str,
    ) -> impl Future<Output = Result<Option<Choice>, GenAiError>> + Send;
}

/// [`Judge`] backed by a forced function call on the generative backend.
#[derive(Debug, Clone)]
pub struct ModelJudge {
    client: GenAiClient,
    model: String,
}

impl ModelJudge {
    pub fn new(client: GenAiClient, config: &GenAiConfig) -> Self {
        Self {
            client,
            model: config.judge_model.clone(),
        }
    }
}

impl Judge for ModelJudge {
    async fn compare(&self, first: &str, second: &str) -> Result<Option<Choice>, GenAiError> {
        let request = GenerateRequest {
            contents: vec![Content::user(prompts::judge_prompt(first, second))],
            system_instruction: Some(Content::system(prompts::JUDGE_SYSTEM)),
            generation_config: Some(GenerationConfig::no_thinking(1.1, 128)),
            tools: vec![Tool {
                function_declarations: vec![prompts::judge_function()],
            }],
            tool_config: Some(ToolConfig::require_call()),
        };
        let policy = HedgePolicy::after(JUDGE_HEDGE_AFTER);
        let reply = hedged(&policy, || self.client.generate(&self.model, &request)).await?;

        let choice = reply
            .function_args(prompts::JUDGE_FUNCTION)
            .and_then(|args| args.get("best"))
            .and_then(serde_json::Value::as_str)
            .and_then(Choice::from_label);
        if choice.is_none() {
            tracing::debug!("Judge reply carried no verdict");
        }
        Ok(choice)
    }
}
