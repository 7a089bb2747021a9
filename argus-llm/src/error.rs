use thiserror::Error;

/// Errors from the reasoning service.
///
/// All of these are transient from the planner's point of view: every call
/// site has a deterministic fallback.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The service is disabled or has no API key configured.
    #[error("reasoning service not configured: {0}")]
    NotConfigured(String),

    /// The HTTP call failed.
    #[error("reasoning service http error: {0}")]
    Http(String),

    /// The call exceeded the configured timeout.
    #[error("reasoning service timed out after {0}s")]
    Timeout(u64),

    /// The service answered with a non-success status.
    #[error("reasoning service returned status {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },

    /// No JSON could be extracted from the model output.
    #[error("reasoning output parse error: {0}")]
    Parse(String),

    /// The model returned an empty candidate list or empty text.
    #[error("reasoning service returned no output")]
    Empty,

    /// The client could not be constructed.
    #[error("reasoning client configuration error: {0}")]
    Configuration(String),
}
