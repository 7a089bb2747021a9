use thiserror::Error;

/// Errors from control-plane storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not serve the request.
    #[error("store backend unavailable: {0}")]
    Backend(String),

    /// A stored value could not be (de)serialized.
    #[error("store serialization error: {0}")]
    Serialization(String),
}
