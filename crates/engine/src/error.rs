use helm_ports::SubmissionError;
use thiserror::Error;

/// Fatal engine lifecycle errors.
///
/// Everything that can go wrong inside a trade cycle is handled there
/// and ends the cycle only; the engine itself fails solely on startup.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Order submitter failed to initialize: {0}")]
    SubmitterInit(#[from] SubmissionError),
}
