//! Generative text provider capability and the Gemini implementation.

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use enricher_shared::{EnricherError, ProviderOptions, Result};

/// A generative text provider: one free-text prompt in, one completion out.
///
/// Implementations are best-effort; callers must tolerate any error.
#[async_trait]
pub trait TextGenerator: Send + Sync + fmt::Debug {
    /// Human-readable provider name for tracing.
    fn name(&self) -> &str;

    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Gemini wire types
// ---------------------------------------------------------------------------

#[derive(Debug, serde::Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, serde::Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, serde::Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, serde::Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, serde::Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, serde::Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, serde::Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate, parts joined in order.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        Some(text)
    }
}

// ---------------------------------------------------------------------------
// GeminiProvider
// ---------------------------------------------------------------------------

/// Google Gemini `generateContent` client.
pub struct GeminiProvider {
    client: Client,
    base_url: Url,
    model: String,
    api_key: Option<String>,
}

impl GeminiProvider {
    pub fn new(opts: &ProviderOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(opts.timeout)
            .build()
            .map_err(|e| EnricherError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: opts.base_url.clone(),
            model: opts.model.clone(),
            api_key: opts.api_key.clone(),
        })
    }

    /// Whether an API key is available. Without one every call fails.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> Result<Url> {
        self.base_url
            .join(&format!("v1beta/models/{}:generateContent", self.model))
            .map_err(|e| EnricherError::config(format!("invalid provider endpoint: {e}")))
    }
}

impl fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url.as_str())
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip_all, fields(model = %self.model, prompt_chars = prompt.chars().count()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| EnricherError::Provider("no API key configured".into()))?;

        let request = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let url = self.endpoint()?;
        debug!(%url, "sending generateContent request");

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EnricherError::Provider(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(EnricherError::Provider(format!("HTTP {status}: {snippet}")));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| EnricherError::Provider(format!("malformed response: {e}")))?;

        let text = parsed
            .into_text()
            .ok_or_else(|| EnricherError::Provider("response has no candidates".into()))?;

        if text.trim().is_empty() {
            return Err(EnricherError::Provider("empty completion".into()));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer, api_key: Option<&str>) -> GeminiProvider {
        GeminiProvider::new(&ProviderOptions {
            base_url: Url::parse(&server.uri()).unwrap(),
            model: "gemini-pro".into(),
            api_key: api_key.map(String::from),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn returns_candidate_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-pro:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "Rewrite this"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Rewritten "}, {"text": "article"}]},
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, Some("test-key"));
        let text = provider.generate("Rewrite this").await.unwrap();
        assert_eq!(text, "Rewritten article");
    }

    #[tokio::test]
    async fn quota_error_is_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server, Some("k")).generate("p").await.unwrap_err();
        assert!(matches!(err, EnricherError::Provider(_)));
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn blocked_prompt_without_candidates_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server, Some("k")).generate("p").await.unwrap_err();
        assert!(err.to_string().contains("no candidates"));
    }

    #[tokio::test]
    async fn blank_completion_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "  \n"}]}}]
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server, Some("k")).generate("p").await.unwrap_err();
        assert!(err.to_string().contains("empty completion"));
    }

    #[tokio::test]
    async fn missing_key_fails_without_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let provider = provider_for(&server, None);
        assert!(!provider.has_api_key());
        let err = provider.generate("p").await.unwrap_err();
        assert!(err.to_string().contains("no API key"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let provider = GeminiProvider::new(&ProviderOptions {
            base_url: Url::parse("https://generativelanguage.googleapis.com").unwrap(),
            model: "gemini-pro".into(),
            api_key: Some("super-secret".into()),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        let debug = format!("{provider:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
