use serde::{Deserialize, Serialize};

/// Point-in-time view of the portfolio, computed on demand per trade cycle.
///
/// `value` is the sum of `size * mark_price` across positions with a valid
/// mark. Never cached across cycles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    /// Mark-to-market value of all open positions
    pub value: f64,
    /// Number of symbols with a non-flat position
    pub open_positions: usize,
}

impl PortfolioSnapshot {
    pub fn empty() -> Self {
        Self {
            value: 0.0,
            open_positions: 0,
        }
    }
}
