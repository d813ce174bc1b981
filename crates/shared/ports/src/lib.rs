//! Helm Ports
//!
//! Port definitions (traits) for the helm trading engine.
//! These define the boundaries between the orchestration core and
//! infrastructure: order submission, state persistence, and exchange
//! market metadata.

mod error;
mod metadata;
mod state_store;
mod submitter;

pub use error::{PersistenceError, SubmissionError};
pub use metadata::{MarketMetadata, PrecisionRule, SymbolLimits, SymbolPrecision};
pub use state_store::StateStore;
pub use submitter::{ExecutionReport, ExecutionStatus, Fill, OrderSubmitter};
