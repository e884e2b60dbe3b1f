use crate::error::{QualityCostError, Result};
use crate::llm::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use log::{debug, warn};
use std::env;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Fixed model identifier for all completions.
pub const COMPLETION_MODEL: &str = "gpt-4o-mini";

/// One interaction blocks on the network call; expiry surfaces as an
/// external-service error like any other failure.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the chat-completion endpoint.
///
/// The API key is captured once at construction. A missing key does not
/// fail construction: it degrades every completion request to an
/// external-service error, keeping the rest of the dashboard usable.
#[derive(Clone)]
pub struct CompletionClient {
    api_key: Option<String>,
    base_url: String,
}

impl CompletionClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
        }
    }

    /// Reads `OPENAI_API_KEY` and the optional `OPENAI_BASE_URL` override.
    pub fn from_env() -> Self {
        let api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            warn!("OPENAI_API_KEY is not set; insight generation will fail until it is provided");
        }
        let base_url =
            env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(api_key, base_url)
    }

    /// Sends one user-role message and returns the completion text verbatim.
    ///
    /// Any failure (absent key, connect error, timeout, non-success status,
    /// malformed body) maps to an external-service error carrying the
    /// reason. There is no retry and no fallback text.
    pub fn request_completion(&self, prompt: &str, temperature: f64) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            QualityCostError::ExternalService(
                "OPENAI_API_KEY is not set; cannot request a completion".to_string(),
            )
        })?;

        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                QualityCostError::ExternalService(format!("failed to build HTTP client: {}", e))
            })?;

        let payload = ChatCompletionRequest {
            model: COMPLETION_MODEL.to_string(),
            messages: vec![ChatMessage::user(prompt)],
            temperature,
        };

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        debug!("requesting completion from {} (model {})", url, COMPLETION_MODEL);

        let response = client
            .post(&url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .map_err(|e| {
                QualityCostError::ExternalService(format!("completion request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(QualityCostError::ExternalService(format!(
                "completion API error (status {}): {}",
                status, body
            )));
        }

        let body: ChatCompletionResponse = response.json().map_err(|e| {
            QualityCostError::ExternalService(format!("malformed completion response: {}", e))
        })?;

        let text = body
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                QualityCostError::ExternalService("no choices returned".to_string())
            })?;

        Ok(text)
    }
}
