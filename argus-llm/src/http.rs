use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::client::ReasoningClient;
use crate::config::ReasoningConfig;
use crate::error::LlmError;

/// HTTP client speaking a `generateContent`-style REST API.
#[derive(Debug)]
pub struct HttpReasoningClient {
    client: reqwest::Client,
    config: ReasoningConfig,
}

impl HttpReasoningClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ReasoningConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| LlmError::Configuration(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Pull the candidate text out of a `generateContent` response:
    /// `candidates[0].content.parts[0].text`.
    fn candidate_text(data: &Value) -> Result<String, LlmError> {
        let text = data
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.pointer("/content/parts/0/text"))
            .and_then(Value::as_str)
            .unwrap_or("");
        if text.is_empty() {
            return Err(LlmError::Empty);
        }
        Ok(text.to_owned())
    }
}

#[async_trait]
impl ReasoningClient for HttpReasoningClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        if !self.config.is_configured() {
            return Err(LlmError::NotConfigured("api key not set".to_owned()));
        }

        let url = format!(
            "{}/models/{model}:generateContent",
            self.config.endpoint.trim_end_matches('/')
        );
        let body = json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {
                "temperature": self.config.temperature,
                // Latency matters more than depth inside a control loop.
                "thinkingConfig": {"thinkingBudget": 0},
            },
        });

        debug!(model, "sending reasoning request");
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.config.timeout_seconds)
                } else {
                    LlmError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: body.chars().take(400).collect(),
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;
        Self::candidate_text(&data)
    }

    fn cascade(&self) -> Vec<String> {
        self.config.models.clone()
    }

    fn is_available(&self) -> bool {
        self.config.is_configured()
    }
}
