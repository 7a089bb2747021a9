use thiserror::Error;

/// Errors from event chain storage.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The backing store could not serve the request. Fatal for the run
    /// whose append failed.
    #[error("audit backend unavailable: {0}")]
    Backend(String),

    /// A payload could not be serialized.
    #[error("audit serialization error: {0}")]
    Serialization(String),
}
