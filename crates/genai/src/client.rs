//! REST client for the generative backend.
//!
//! Wraps `POST {base}/v1beta/models/{model}:generateContent` using
//! [`reqwest`]. A 503 reply maps to [`GenAiError::Overloaded`] so the hedged
//! call policy can retry it.

use crate::error::{GenAiError, OVERLOADED_STATUS};
use crate::messages::{GenerateRequest, GenerateResponse};

/// HTTP client for one backend endpoint and API key.
#[derive(Debug, Clone)]
pub struct GenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GenAiClient {
    /// Create a new client.
    ///
    /// * `base_url` - Endpoint root without trailing slash, e.g.
    ///   `https://generativelanguage.googleapis.com`.
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    /// Run one generation call against `model`.
    pub async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, GenAiError> {
        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, model
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let reply = response.json::<GenerateResponse>().await?;

        if let Some(usage) = reply.usage_metadata {
            tracing::debug!(
                model,
                tokens_in = usage.prompt_token_count,
                tokens_out = usage.candidates_token_count,
                "Model call complete"
            );
        }
        Ok(reply)
    }

    // ---- private helpers ----

    /// Map non-2xx replies to errors, keeping the body for debugging.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, GenAiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        if status.as_u16() == OVERLOADED_STATUS {
            return Err(GenAiError::Overloaded(body));
        }
        Err(GenAiError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use mockito::Matcher;

    use super::*;
    use crate::messages::Content;

    const PATH: &str = "/v1beta/models/test-model:generateContent";

    fn request() -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content::user("hello")],
            ..GenerateRequest::default()
        }
    }

    #[tokio::test]
    async fn generate_posts_and_parses_reply() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .match_query(Matcher::UrlEncoded("key".into(), "secret".into()))
            .match_body(Matcher::PartialJson(serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"hi there"}]}}]}"#)
            .create_async()
            .await;

        let client = GenAiClient::new(server.url(), "secret".into());
        let reply = client.generate("test-model", &request()).await.unwrap();
        assert_eq!(reply.text(), "hi there");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn status_503_is_overload() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", PATH)
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("model is overloaded")
            .create_async()
            .await;

        let client = GenAiClient::new(server.url(), "k".into());
        let err = client.generate("test-model", &request()).await.unwrap_err();
        assert_matches!(err, GenAiError::Overloaded(body) if body.contains("overloaded"));
    }

    #[tokio::test]
    async fn other_errors_keep_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", PATH)
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body("API key not valid")
            .create_async()
            .await;

        let client = GenAiClient::new(server.url(), "k".into());
        let err = client.generate("test-model", &request()).await.unwrap_err();
        assert_matches!(err, GenAiError::Api { status: 400, .. });
    }
}
