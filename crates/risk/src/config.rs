use serde::{Deserialize, Serialize};

/// Risk gate limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Fractional drawdown from peak that halts trading (e.g. 0.10 = 10%).
    /// Trading resumes once drawdown recovers below half this value.
    pub max_drawdown_pct: f64,
    /// Maximum fraction of portfolio value risked on one trade
    /// (risk = |price - stop_loss| * quantity)
    pub max_risk_per_trade_pct: f64,
    /// Maximum number of symbols with an open position
    pub max_open_positions: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_drawdown_pct: 0.10,
            max_risk_per_trade_pct: 0.01,
            max_open_positions: 5,
        }
    }
}
