//! Helm Risk
//!
//! Portfolio-level risk gate. Every signal passes through `RiskGate::validate`
//! before it may reach the execution boundary: a drawdown halt blocks all
//! trading, a position-count limit blocks new symbols, and a per-trade risk
//! limit shrinks oversized orders. The gate is a pure filter over snapshots;
//! it never mutates positions or talks to the exchange.

mod config;
mod gate;

pub use config::RiskConfig;
pub use gate::{PortfolioView, RejectReason, RiskGate, RiskRejection};
