use async_trait::async_trait;

use crate::error::LlmError;

/// One call to the reasoning service: a prompt in, raw model text out.
///
/// Implementations must be `Send + Sync`; planners hold them behind an
/// `Arc<dyn ReasoningClient>` and never parse inside the client.
#[async_trait]
pub trait ReasoningClient: Send + Sync + std::fmt::Debug {
    /// Generate text with a specific model.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, LlmError>;

    /// Candidate models, fastest first.
    fn cascade(&self) -> Vec<String>;

    /// Whether calls can be attempted at all (keys configured, models
    /// known). Callers that must not degrade silently check this first.
    fn is_available(&self) -> bool {
        true
    }

    /// Walk the cascade until a model answers with non-empty text.
    /// Returns the text and the model that produced it.
    async fn generate_cascading(&self, prompt: &str) -> Result<(String, String), LlmError> {
        let mut last_err = LlmError::Empty;
        for model in self.cascade() {
            match self.generate(&model, prompt).await {
                Ok(text) if !text.trim().is_empty() => return Ok((text, model)),
                Ok(_) => last_err = LlmError::Empty,
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }
}
