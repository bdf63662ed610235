//! Client for the chat-completions style text-generation service.

use std::fmt;
use std::sync::Arc;

use genail_core::error::ScriptError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::transport::Transport;

/// Default generation model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default chat-completions endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// One conversation turn sent as generation context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Endpoint, model and credential for text generation.
#[derive(Clone)]
pub struct GenerationConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
        }
    }
}

// Hand-written so the credential never reaches logs.
impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Sends the accumulated message list and returns the generated text.
pub struct TextGenerator<T> {
    config: GenerationConfig,
    transport: Arc<T>,
}

impl<T: Transport> TextGenerator<T> {
    pub fn new(config: GenerationConfig, transport: Arc<T>) -> Self {
        Self { config, transport }
    }

    /// POST `{model, messages}` with the bearer credential.
    ///
    /// The credential is checked at call time, so a run with generation
    /// enabled but no key only fails the `generate` statements.
    pub async fn generate(&self, messages: &[ChatMessage]) -> Result<String, ScriptError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ScriptError::configuration("OPENAI_API_KEY not configured"))?;

        let url = Url::parse(&self.config.endpoint).map_err(|e| {
            ScriptError::configuration(format!("invalid generation endpoint: {e}"))
        })?;
        if url.scheme() != "https" {
            return Err(ScriptError::configuration(
                "generation endpoint must use https",
            ));
        }

        let body = json!({
            "model": self.config.model,
            "messages": messages,
        });

        tracing::debug!(
            model = %self.config.model,
            messages = messages.len(),
            "Requesting generation"
        );
        let response = self
            .transport
            .post_json(url, body, Some(api_key.to_string()))
            .await?;
        extract_content(&response)
    }
}

/// Pull `choices[0].message.content` out of a completion response.
fn extract_content(response: &JsonValue) -> Result<String, ScriptError> {
    response
        .pointer("/choices/0/message/content")
        .and_then(JsonValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            ScriptError::Upstream(
                "generation response missing choices[0].message.content".to_string(),
            )
        })
}
