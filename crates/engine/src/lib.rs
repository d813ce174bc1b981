//! Helm Engine
//!
//! The orchestration layer. `TradingManager` owns the trade cycle: for
//! every market data update it runs strategy, risk gate, formatter and
//! submitter in order and applies the resulting fill to the position
//! store exactly once. Cycles for different symbols run fully
//! concurrently; per symbol at most one cycle is ever in flight, and an
//! update arriving while one runs is dropped, not queued.

mod config;
mod error;
mod feed;
mod manager;

pub use config::EngineConfig;
pub use error::EngineError;
pub use feed::SimulatedFeed;
pub use manager::{CycleOutcome, TradingManager};
