use serde::{Deserialize, Serialize};

/// Configuration for the reasoning-service client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    /// Base URL of the `generateContent`-style API.
    pub endpoint: String,
    /// API key sent in the `x-goog-api-key` header. Empty disables calls.
    pub api_key: String,
    /// Candidate models, fastest first. Callers walk this cascade until one
    /// answers.
    pub models: Vec<String>,
    /// Per-call timeout in seconds.
    pub timeout_seconds: u64,
    /// Sampling temperature. Low keeps planning predictable.
    pub temperature: f64,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_owned(),
            api_key: String::new(),
            models: vec![
                "gemini-2.5-flash".to_owned(),
                "gemini-robotics-er-1.5-preview".to_owned(),
            ],
            timeout_seconds: 30,
            temperature: 0.2,
        }
    }
}

impl ReasoningConfig {
    /// Whether calls can be attempted at all.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.models.is_empty()
    }
}
