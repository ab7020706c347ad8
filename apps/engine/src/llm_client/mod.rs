//! Completion client — the single point of entry for calls to the external
//! generative-completion service.
//!
//! One POST per request, no retry and no engine-side timeout: a transport
//! failure or non-2xx status is surfaced as an error for the orchestrator to
//! fold into an explained result (never a fatal fault).

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod recovery;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const TEMPERATURE: f64 = 0.2;
const MAX_OUTPUT_TOKENS: u32 = 512;

/// Longest raw-body excerpt carried in errors and reasons, for diagnostics.
pub const DETAIL_BUDGET: usize = 400;

/// Truncates diagnostic text to `max` characters on a char boundary.
pub fn truncate_detail(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max).collect();
    truncated.push('…');
    truncated
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("completion service returned no text content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenates the text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let content = candidate.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Client for the vendor's `generateContent` endpoint.
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl CompletionClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_API_BASE.to_string(),
            api_key,
            model,
        }
    }

    /// Overrides the API base URL. Used by tests to point at a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Performs the single completion request and returns the concatenated
    /// text parts of the response.
    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let request_body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self.client.post(&url).json(&request_body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body: truncate_detail(&body, DETAIL_BUDGET),
            });
        }

        let envelope: GenerateResponse = response.json().await?;
        let text = envelope.text().ok_or(LlmError::EmptyContent)?;
        debug!(model = %self.model, chars = text.len(), "completion received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_truncate_detail() {
        assert_eq!(truncate_detail("ok", 400), "ok");
        let long = "y".repeat(500);
        let trimmed = truncate_detail(&long, 400);
        assert_eq!(trimmed.chars().count(), 401);
        assert!(trimmed.ends_with('…'));
    }

    #[test]
    fn test_envelope_text_concatenates_parts() {
        let envelope: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [{"text": "{\"card_id\""}, {"text": ": 4}"}]}
            }]
        }))
        .unwrap();
        assert_eq!(envelope.text().unwrap(), "{\"card_id\": 4}");
    }

    #[test]
    fn test_envelope_without_candidates_has_no_text() {
        let envelope: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(envelope.text().is_none());
    }

    #[tokio::test]
    async fn test_complete_posts_prompt_and_extracts_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gemini-pro:generateContent"))
            .and(body_partial_json(json!({
                "generationConfig": {"temperature": 0.2, "maxOutputTokens": 512}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"parts": [{"text": "{\"card_id\": 7, \"reason\": \"fits\"}"}]}
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = CompletionClient::new("test-key".to_string(), "gemini-pro".to_string())
            .with_base_url(server.uri());
        let text = client.complete("pick a card").await.unwrap();
        assert_eq!(text, "{\"card_id\": 7, \"reason\": \"fits\"}");
    }

    #[tokio::test]
    async fn test_complete_surfaces_non_2xx_with_truncated_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("z".repeat(600)))
            .mount(&server)
            .await;

        let client = CompletionClient::new("test-key".to_string(), "gemini-pro".to_string())
            .with_base_url(server.uri());
        match client.complete("pick a card").await {
            Err(LlmError::Api { status, body }) => {
                assert_eq!(status, 429);
                assert_eq!(body.chars().count(), DETAIL_BUDGET + 1);
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_empty_candidates_is_empty_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let client = CompletionClient::new("k".to_string(), "m".to_string())
            .with_base_url(server.uri());
        assert!(matches!(
            client.complete("prompt").await,
            Err(LlmError::EmptyContent)
        ));
    }
}
