//! Drafting and critiquing layouts.
//!
//! The designer keeps one [`Conversation`] per thread: the opening prompt,
//! then alternating model drafts and critique-derived guidance. Each round
//! sends the whole history so the model refines its previous answer.

use std::future::Future;

use cardsmith_core::bundle::ThreadBundle;
use cardsmith_core::hedge::{hedged, HedgePolicy};
use cardsmith_core::svg::extract_svg;

use crate::client::GenAiClient;
use crate::config::{GenAiConfig, CRITIQUE_HEDGE_AFTER, DRAFT_HEDGE_AFTER};
use crate::error::GenAiError;
use crate::messages::{Content, GenerateRequest, GenerationConfig, Part};
use crate::prompts;

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// Drafting history of one thread.
#[derive(Debug, Clone)]
pub struct Conversation {
    turns: Vec<Content>,
}

impl Conversation {
    /// Start from the opening prompt for `bundle`.
    pub fn start(bundle: &ThreadBundle) -> Self {
        Self {
            turns: vec![Content::user(prompts::draft_prompt(bundle))],
        }
    }

    /// Record a draft and the guidance for improving it.
    ///
    /// Only the latest draft is kept: the history is always the opening
    /// prompt followed by at most one draft/guidance exchange.
    pub fn refine(&mut self, svg: &str, guidance: &str) {
        self.turns.truncate(1);
        self.turns.push(Content::model(prompts::svg_turn(svg)));
        self.turns
            .push(Content::user(prompts::guidance_turn(guidance)));
    }

    pub fn turns(&self) -> &[Content] {
        &self.turns
    }
}

// ---------------------------------------------------------------------------
// Designer
// ---------------------------------------------------------------------------

/// Produces drafts and critique for one thread.
pub trait Designer: Send + Sync {
    /// Ask for the next draft. `Ok(None)` when the reply holds no SVG.
    fn draft(
        &self,
        conversation: &Conversation,
    ) -> impl Future<Output = Result<Option<String>, GenAiError>> + Send;

    /// Ask for guidance on improving `svg`.
    fn critique(
        &self,
        bundle: &ThreadBundle,
        svg: &str,
    ) -> impl Future<Output = Result<String, GenAiError>> + Send;
}

/// [`Designer`] backed by the generative backend.
#[derive(Debug, Clone)]
pub struct ModelDesigner {
    client: GenAiClient,
    draft_model: String,
    critique_model: String,
}

impl ModelDesigner {
    pub fn new(client: GenAiClient, config: &GenAiConfig) -> Self {
        Self {
            client,
            draft_model: config.draft_model.clone(),
            critique_model: config.critique_model.clone(),
        }
    }
}

impl Designer for ModelDesigner {
    async fn draft(&self, conversation: &Conversation) -> Result<Option<String>, GenAiError> {
        let request = GenerateRequest {
            contents: conversation.turns().to_vec(),
            system_instruction: Some(Content::system(prompts::DRAFT_SYSTEM)),
            generation_config: Some(GenerationConfig::no_thinking(1.0, 900)),
            ..GenerateRequest::default()
        };
        let policy = HedgePolicy::after(DRAFT_HEDGE_AFTER);
        let reply = hedged(&policy, || self.client.generate(&self.draft_model, &request)).await?;

        let text = reply.text();
        let svg = extract_svg(&text);
        if svg.is_none() {
            tracing::warn!(reply = %text, "Draft reply holds no SVG");
        }
        Ok(svg)
    }

    async fn critique(&self, bundle: &ThreadBundle, svg: &str) -> Result<String, GenAiError> {
        let request = GenerateRequest {
            contents: vec![
                Content::user(prompts::draft_prompt(bundle)),
                Content::model(prompts::svg_turn(svg)),
                Content {
                    role: Some(crate::messages::ROLE_USER.to_string()),
                    parts: vec![
                        Part::text(prompts::svg_turn(svg)),
                        Part::text(prompts::critique_prompt(bundle.centered())),
                    ],
                },
            ],
            system_instruction: Some(Content::system(prompts::CRITIQUE_SYSTEM)),
            generation_config: Some(GenerationConfig::no_thinking(1.1, 512)),
            ..GenerateRequest::default()
        };
        let policy = HedgePolicy::after(CRITIQUE_HEDGE_AFTER);
        let reply =
            hedged(&policy, || self.client.generate(&self.critique_model, &request)).await?;
        Ok(reply.text().trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use cardsmith_core::bundle::{Alignment, FontRef, Orientation};
    use cardsmith_core::texts::OrderedTexts;
    use mockito::Matcher;

    use super::*;

    fn bundle() -> ThreadBundle {
        let mut texts = OrderedTexts::new();
        texts.insert("name".into(), "Jane Doe".into());
        ThreadBundle {
            thread: "abc123".into(),
            dimens: Orientation::Wide,
            front: true,
            texts,
            fonts: vec![FontRef { name: "Bungee".into(), key: "b.ttf".into() }],
            align: Alignment::Left,
        }
    }

    fn designer(url: String) -> ModelDesigner {
        ModelDesigner {
            client: GenAiClient::new(url, "k".into()),
            draft_model: "draft".into(),
            critique_model: "critic".into(),
        }
    }

    fn reply(text: &str) -> String {
        serde_json::json!({"candidates": [{"content": {"parts": [{"text": text}]}}]}).to_string()
    }

    #[test]
    fn refine_keeps_only_latest_exchange() {
        let mut conversation = Conversation::start(&bundle());
        conversation.refine("<svg>1</svg>", "bigger");
        conversation.refine("<svg>2</svg>", "smaller");
        let turns = conversation.turns();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1].parts[0].text.as_deref(), Some("The SVG:\n<svg>2</svg>"));
        assert_eq!(turns[2].role.as_deref(), Some("user"));
    }

    #[tokio::test]
    async fn draft_extracts_svg() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/draft:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(reply("```svg\n<svg><text>Jane</text></svg>\n```"))
            .create_async()
            .await;

        let conversation = Conversation::start(&bundle());
        let svg = designer(server.url()).draft(&conversation).await.unwrap();
        assert_eq!(svg.as_deref(), Some("<svg><text>Jane</text></svg>"));
    }

    #[tokio::test]
    async fn draft_without_svg_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/draft:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(reply("I cannot help with that"))
            .create_async()
            .await;

        let conversation = Conversation::start(&bundle());
        assert_eq!(designer(server.url()).draft(&conversation).await.unwrap(), None);
    }

    #[tokio::test]
    async fn critique_uses_critic_model() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/critic:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(reply("  Make the name bolder.\n"))
            .create_async()
            .await;

        let guidance = designer(server.url())
            .critique(&bundle(), "<svg></svg>")
            .await
            .unwrap();
        assert_eq!(guidance, "Make the name bolder.");
        mock.assert_async().await;
    }
}
