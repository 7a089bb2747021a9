use thiserror::Error;

/// Error kinds surfaced at the Argus API boundary.
///
/// Internal crates carry their own error types; the runtime maps them into
/// this taxonomy before anything leaves the system. Transient faults inside
/// the run loop never surface here — they become ALERT events or status
/// transitions instead.
#[derive(Debug, Error)]
pub enum ArgusError {
    /// Malformed caller input; nothing was mutated.
    #[error("validation error: {0}")]
    Validation(String),

    /// The referenced mission or run does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The requested state-machine transition is not allowed.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The simulator could not be reached or timed out.
    #[error("simulator unreachable: {0}")]
    Simulator(String),

    /// The reasoning service was unavailable or returned garbage.
    #[error("reasoning unavailable: {0}")]
    Reasoning(String),

    /// A storage backend failed; fatal for the affected run.
    #[error("store unavailable: {0}")]
    Store(String),

    /// Chain verification found a broken link. Never raised during append.
    #[error("chain integrity violation: {0}")]
    ChainIntegrity(String),
}
