use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::client::ReasoningClient;
use crate::error::LlmError;

/// A scripted reasoning client for tests.
///
/// Responses are popped in order; once the script runs out, every call
/// fails with [`LlmError::Empty`], which exercises fallback paths. Prompts
/// are recorded for assertion.
#[derive(Debug, Default)]
pub struct ScriptedReasoningClient {
    responses: Mutex<VecDeque<Result<String, ()>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedReasoningClient {
    /// A client with no scripted responses: every call fails.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// A client that answers the given responses in order.
    #[must_use]
    pub fn with_responses(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue one failing call.
    pub fn push_failure(&self) {
        self.responses.lock().push_back(Err(()));
    }

    /// Queue one successful response.
    pub fn push_response(&self, response: impl Into<String>) {
        self.responses.lock().push_back(Ok(response.into()));
    }

    /// Prompts received so far, in call order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl ReasoningClient for ScriptedReasoningClient {
    async fn generate(&self, _model: &str, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().push(prompt.to_owned());
        match self.responses.lock().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(())) => Err(LlmError::Http("scripted failure".to_owned())),
            None => Err(LlmError::Empty),
        }
    }

    fn cascade(&self) -> Vec<String> {
        vec!["scripted".to_owned()]
    }
}
