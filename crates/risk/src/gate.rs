use crate::config::RiskConfig;
use helm_core::{FLAT_EPSILON, Signal, SignalAction};
use log::{debug, error, warn};
use std::sync::Mutex;
use thiserror::Error;

/// Risk per unit below this is treated as undefined (stop at entry price).
const MIN_RISK_PER_UNIT: f64 = 1e-9;

/// Cross-symbol portfolio facts the gate needs for one validation.
///
/// A copy taken under the position store's lock; the gate never reads
/// live position state.
#[derive(Debug, Clone, Copy)]
pub struct PortfolioView {
    /// Mark-to-market portfolio value
    pub value: f64,
    /// Number of symbols with an open position
    pub open_positions: usize,
    /// Does the signal's symbol already hold an open position?
    pub symbol_has_position: bool,
    /// Current signed size for the signal's symbol
    pub current_size: f64,
}

/// Why a signal was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Trading halted on drawdown
    #[error("trading halted (drawdown)")]
    Halted,
    /// Opening a new symbol would exceed the position-count limit
    #[error("max open positions reached")]
    MaxOpenPositions,
    /// Stop loss coincides with entry; risk-based sizing is undefined
    #[error("risk per unit undefined")]
    RiskUndefined,
    /// Portfolio value was NaN or infinite
    #[error("invalid portfolio value")]
    InvalidPortfolioValue,
}

/// A rejected signal, with the reason and the signal carried for
/// observability. Expected control flow, not a fault.
#[derive(Error, Debug, Clone)]
#[error("[{symbol}] signal rejected: {reason}")]
pub struct RiskRejection {
    pub symbol: String,
    pub reason: RejectReason,
    pub signal: Signal,
}

#[derive(Debug, Default)]
struct GateState {
    /// Monotonic high-water mark of observed portfolio values
    peak_value: f64,
    /// Last computed drawdown fraction
    drawdown: f64,
    halted: bool,
}

/// Portfolio-level risk gate.
///
/// Single-writer-contended state (peak value, halt flag) sits behind one
/// mutex so concurrent per-symbol cycles observe and validate without
/// racing each other.
pub struct RiskGate {
    config: RiskConfig,
    state: Mutex<GateState>,
}

impl RiskGate {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            config,
            state: Mutex::new(GateState::default()),
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Record a portfolio value observation and update the halt state.
    ///
    /// NaN/infinite values are logged and ignored, keeping previous state.
    /// The halt engages at `drawdown >= max_drawdown_pct` (boundary
    /// inclusive) and releases only below half the limit, so the flag
    /// cannot flap at the threshold.
    pub fn observe_portfolio_value(&self, value: f64) {
        if !value.is_finite() {
            error!("Invalid portfolio value {}, skipping drawdown check", value);
            return;
        }

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if value > state.peak_value {
            state.peak_value = value;
            debug!("New portfolio peak: {:.2}", state.peak_value);
        }

        state.drawdown = if state.peak_value > 0.0 {
            (state.peak_value - value) / state.peak_value
        } else {
            0.0
        };

        if state.drawdown >= self.config.max_drawdown_pct {
            if !state.halted {
                error!(
                    "Max drawdown breached ({:.2}% >= {:.2}%), halting trading",
                    state.drawdown * 100.0,
                    self.config.max_drawdown_pct * 100.0
                );
                state.halted = true;
            }
        } else if state.halted && state.drawdown < self.config.max_drawdown_pct / 2.0 {
            warn!(
                "Drawdown recovered to {:.2}%, re-enabling trading",
                state.drawdown * 100.0
            );
            state.halted = false;
        }
    }

    pub fn is_halted(&self) -> bool {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).halted
    }

    /// Last computed drawdown fraction
    pub fn drawdown(&self) -> f64 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).drawdown
    }

    /// Validate a signal against the current portfolio state.
    ///
    /// Returns the signal (possibly with a reduced quantity) or a
    /// rejection. Hold signals pass through untouched.
    pub fn validate(
        &self,
        signal: Signal,
        portfolio: PortfolioView,
    ) -> Result<Signal, RiskRejection> {
        if signal.is_hold() {
            return Ok(signal);
        }

        if !portfolio.value.is_finite() {
            return Err(self.reject(signal, RejectReason::InvalidPortfolioValue));
        }

        if self.is_halted() {
            return Err(self.reject(signal, RejectReason::Halted));
        }

        // Opening (or increasing) a symbol with no open position counts
        // against the position limit; reducing or closing never does.
        let increasing = match signal.action {
            SignalAction::Buy => portfolio.current_size >= -FLAT_EPSILON,
            SignalAction::Sell => portfolio.current_size <= FLAT_EPSILON,
            SignalAction::Hold => false,
        };
        if increasing
            && !portfolio.symbol_has_position
            && portfolio.open_positions >= self.config.max_open_positions
        {
            return Err(self.reject(signal, RejectReason::MaxOpenPositions));
        }

        if let Some(stop_loss) = signal.stop_loss {
            return self.apply_risk_sizing(signal, stop_loss, portfolio.value);
        }

        debug!("[{}] Signal passed risk validation", signal.symbol);
        Ok(signal)
    }

    /// Shrink quantity so that |price - stop| * quantity stays within the
    /// per-trade risk budget. Oversized signals are resized, never
    /// rejected; only an undefined risk-per-unit rejects.
    fn apply_risk_sizing(
        &self,
        signal: Signal,
        stop_loss: f64,
        portfolio_value: f64,
    ) -> Result<Signal, RiskRejection> {
        if portfolio_value <= 0.0 {
            warn!(
                "[{}] Portfolio value {:.2} <= 0, skipping per-trade risk sizing",
                signal.symbol, portfolio_value
            );
            return Ok(signal);
        }

        let risk_per_unit = (signal.price - stop_loss).abs();
        let risk_amount = risk_per_unit * signal.quantity.abs();
        let risk_pct = risk_amount / portfolio_value;

        if risk_pct <= self.config.max_risk_per_trade_pct {
            debug!(
                "[{}] Trade risk {:.4}% within limit",
                signal.symbol,
                risk_pct * 100.0
            );
            return Ok(signal);
        }

        if risk_per_unit <= MIN_RISK_PER_UNIT {
            return Err(self.reject(signal, RejectReason::RiskUndefined));
        }

        let allowed_risk = portfolio_value * self.config.max_risk_per_trade_pct;
        let new_quantity = allowed_risk / risk_per_unit;
        warn!(
            "[{}] Trade risk {:.4}% exceeds limit {:.4}%, reducing quantity {:.8} -> {:.8}",
            signal.symbol,
            risk_pct * 100.0,
            self.config.max_risk_per_trade_pct * 100.0,
            signal.quantity,
            new_quantity
        );
        Ok(signal.with_quantity(new_quantity))
    }

    fn reject(&self, signal: Signal, reason: RejectReason) -> RiskRejection {
        let rejection = RiskRejection {
            symbol: signal.symbol.clone(),
            reason,
            signal,
        };
        warn!("{}", rejection);
        rejection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> RiskGate {
        RiskGate::new(RiskConfig {
            max_drawdown_pct: 0.10,
            max_risk_per_trade_pct: 0.01,
            max_open_positions: 2,
        })
    }

    fn flat_view(value: f64, open_positions: usize) -> PortfolioView {
        PortfolioView {
            value,
            open_positions,
            symbol_has_position: false,
            current_size: 0.0,
        }
    }

    #[test]
    fn test_halt_engages_at_boundary_inclusive() {
        let gate = gate();
        gate.observe_portfolio_value(1_000.0);
        assert!(!gate.is_halted());

        // Exactly 10% drawdown: boundary is inclusive
        gate.observe_portfolio_value(900.0);
        assert!(gate.is_halted());
    }

    #[test]
    fn test_halt_never_engages_below_limit() {
        let gate = gate();
        gate.observe_portfolio_value(1_000.0);
        gate.observe_portfolio_value(901.0); // 9.9%
        assert!(!gate.is_halted());
    }

    #[test]
    fn test_hysteresis_band() {
        let gate = gate();
        gate.observe_portfolio_value(1_000.0);
        gate.observe_portfolio_value(899.0); // 10.1% -> halted
        assert!(gate.is_halted());

        // Recovery to 7% drawdown: still inside the band, stays halted
        gate.observe_portfolio_value(930.0);
        assert!(gate.is_halted());

        // Recovery to 4.5% drawdown: below half the limit, resumes
        gate.observe_portfolio_value(955.0);
        assert!(!gate.is_halted());
    }

    #[test]
    fn test_peak_is_monotonic() {
        let gate = gate();
        gate.observe_portfolio_value(1_000.0);
        gate.observe_portfolio_value(500.0);
        gate.observe_portfolio_value(800.0);
        // Peak stays 1000: 800 is a 20% drawdown
        assert!(gate.is_halted());
        assert!((gate.drawdown() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_value_keeps_state() {
        let gate = gate();
        gate.observe_portfolio_value(1_000.0);
        gate.observe_portfolio_value(f64::NAN);
        gate.observe_portfolio_value(f64::INFINITY);
        assert!(!gate.is_halted());
        assert_eq!(gate.drawdown(), 0.0);
    }

    #[test]
    fn test_hold_passes_through() {
        let gate = gate();
        let signal = Signal::hold("BTC/USDT");
        let out = gate.validate(signal.clone(), flat_view(f64::NAN, 99)).unwrap();
        assert_eq!(out, signal);
    }

    #[test]
    fn test_halted_rejects() {
        let gate = gate();
        gate.observe_portfolio_value(1_000.0);
        gate.observe_portfolio_value(850.0);

        let err = gate
            .validate(Signal::buy("BTC/USDT", 100.0, 1.0), flat_view(850.0, 0))
            .unwrap_err();
        assert_eq!(err.reason, RejectReason::Halted);
        assert_eq!(err.symbol, "BTC/USDT");
    }

    #[test]
    fn test_max_open_positions_blocks_new_symbol() {
        let gate = gate();
        let err = gate
            .validate(Signal::buy("BTC/USDT", 100.0, 1.0), flat_view(1_000.0, 2))
            .unwrap_err();
        assert_eq!(err.reason, RejectReason::MaxOpenPositions);
    }

    #[test]
    fn test_existing_position_exempt_from_count_limit() {
        let gate = gate();
        let view = PortfolioView {
            value: 1_000.0,
            open_positions: 2,
            symbol_has_position: true,
            current_size: 0.5,
        };
        assert!(gate.validate(Signal::buy("BTC/USDT", 100.0, 1.0), view).is_ok());
    }

    #[test]
    fn test_reducing_trade_exempt_from_count_limit() {
        let gate = gate();
        // Selling against a long is a reduction even at the limit
        let view = PortfolioView {
            value: 1_000.0,
            open_positions: 2,
            symbol_has_position: false,
            current_size: 0.5,
        };
        assert!(gate.validate(Signal::sell("BTC/USDT", 100.0, 0.5), view).is_ok());
    }

    #[test]
    fn test_oversized_risk_is_shrunk_not_rejected() {
        let gate = gate();
        // risk_per_unit = 10, quantity 5 -> risk 50 = 5% of 1000 (limit 1%)
        let signal = Signal::buy("BTC/USDT", 100.0, 5.0).with_stop_loss(90.0);
        let out = gate.validate(signal, flat_view(1_000.0, 0)).unwrap();
        // allowed risk 10 / risk_per_unit 10 = 1.0
        assert!((out.quantity - 1.0).abs() < 1e-9);
        assert_eq!(out.action, SignalAction::Buy);
    }

    #[test]
    fn test_within_budget_risk_untouched() {
        let gate = gate();
        let signal = Signal::buy("BTC/USDT", 100.0, 0.5).with_stop_loss(99.0);
        // risk = 1 * 0.5 = 0.5 = 0.05% of 1000
        let out = gate.validate(signal.clone(), flat_view(1_000.0, 0)).unwrap();
        assert_eq!(out.quantity, signal.quantity);
    }

    #[test]
    fn test_degenerate_stop_distance_rejects() {
        let gate = gate();
        // Stop almost at entry: the trade is over budget but cannot be
        // resized, so it rejects instead of producing an absurd quantity
        let signal = Signal::buy("BTC/USDT", 100.0, 1e12).with_stop_loss(100.0 - 1e-10);
        let err = gate.validate(signal, flat_view(1_000.0, 0)).unwrap_err();
        assert_eq!(err.reason, RejectReason::RiskUndefined);
    }

    #[test]
    fn test_stop_at_entry_within_budget_passes() {
        let gate = gate();
        // Zero risk per unit means zero risk amount: nothing to resize
        let signal = Signal::buy("BTC/USDT", 100.0, 1.0).with_stop_loss(100.0);
        assert!(gate.validate(signal, flat_view(1_000.0, 0)).is_ok());
    }

    #[test]
    fn test_nonpositive_portfolio_skips_sizing() {
        let gate = gate();
        let signal = Signal::buy("BTC/USDT", 100.0, 5.0).with_stop_loss(90.0);
        let out = gate.validate(signal.clone(), flat_view(0.0, 0)).unwrap();
        assert_eq!(out.quantity, signal.quantity);
    }

    #[test]
    fn test_invalid_portfolio_value_rejects() {
        let gate = gate();
        let err = gate
            .validate(Signal::buy("BTC/USDT", 100.0, 1.0), flat_view(f64::NAN, 0))
            .unwrap_err();
        assert_eq!(err.reason, RejectReason::InvalidPortfolioValue);
    }
}
