use thiserror::Error;

/// Errors surfaced by the order submission boundary.
///
/// Any of these aborts the current trade cycle; the symbol returns to idle
/// and retries on the next market update. Only a failure during
/// `initialize()` is fatal to the engine.
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("Submitter not initialized")]
    NotInitialized,

    #[error("Order rejected by exchange: {0}")]
    Rejected(String),

    #[error("Network error during submission: {0}")]
    Network(String),

    #[error("Invalid order parameters: {0}")]
    InvalidParameters(String),
}

/// Errors from the optional state store.
///
/// Never fatal: in-memory position state stays authoritative for the
/// running process and persistence failures are logged only.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("State store write failed: {0}")]
    Write(String),

    #[error("State store scan failed: {0}")]
    Scan(String),

    #[error("Stored value could not be decoded: {0}")]
    Decode(String),
}
