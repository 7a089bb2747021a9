use thiserror::Error;

/// Errors from simulator calls.
///
/// Every variant is transient from the run controller's point of view: the
/// current tick aborts, and only repeated failures fail the run.
#[derive(Debug, Error)]
pub enum SimError {
    /// The simulator could not be reached, or the call timed out.
    #[error("simulator unreachable: {0}")]
    Unreachable(String),

    /// The simulator answered with a non-success status.
    #[error("simulator returned status {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },

    /// The response body was not the expected JSON shape.
    #[error("simulator response decode error: {0}")]
    Decode(String),

    /// The client could not be constructed.
    #[error("simulator client configuration error: {0}")]
    Configuration(String),
}
