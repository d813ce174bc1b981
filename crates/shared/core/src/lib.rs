//! Helm Core Domain
//!
//! Pure domain types for the helm trading engine.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;

// Re-export commonly used types at crate root
pub use entities::{
    FLAT_EPSILON, MarketDataUpdate, ModelPrediction, OrderType, PortfolioSnapshot, Position,
    Signal, SignalAction,
};
