use crate::traits::{Strategy, StrategyParams};
use helm_core::{MarketDataUpdate, ModelPrediction, Signal};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Momentum strategy parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumConfig {
    /// Fast moving-average window, in updates
    pub short_window: usize,
    /// Slow moving-average window, in updates
    pub long_window: usize,
    /// Target order size in quote currency
    pub trade_notional: f64,
    /// Protective stop distance as a fraction of entry price
    pub stop_loss_pct: f64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            short_window: 10,
            long_window: 30,
            trade_notional: 100.0,
            stop_loss_pct: 0.02,
        }
    }
}

/// Moving-average crossover momentum strategy.
///
/// Buys while the short MA sits above the long MA, sells while below.
/// Holds until both windows are full.
#[derive(Debug)]
pub struct MomentumStrategy {
    config: MomentumConfig,
    prices: VecDeque<f64>,
}

impl MomentumStrategy {
    pub fn new(config: MomentumConfig) -> Self {
        let capacity = config.long_window.max(config.short_window);
        info!(
            "Momentum strategy initialized: short_window={}, long_window={}",
            config.short_window, config.long_window
        );
        Self {
            config,
            prices: VecDeque::with_capacity(capacity),
        }
    }

    fn capacity(&self) -> usize {
        self.config.long_window.max(self.config.short_window)
    }

    fn moving_average(&self, window: usize) -> Option<f64> {
        if window == 0 || self.prices.len() < window {
            return None;
        }
        let sum: f64 = self.prices.iter().rev().take(window).sum();
        Some(sum / window as f64)
    }

    fn sized(&self, signal: Signal) -> Signal {
        let quantity = self.config.trade_notional / signal.price;
        signal.with_quantity(quantity)
    }
}

impl Strategy for MomentumStrategy {
    fn name(&self) -> &'static str {
        "momentum"
    }

    fn on_market_update(&mut self, data: &MarketDataUpdate) {
        if let Some(price) = data.last_trade.filter(|p| p.is_finite() && *p > 0.0) {
            if self.prices.len() == self.capacity() {
                self.prices.pop_front();
            }
            self.prices.push_back(price);
        }
    }

    fn generate_signal(
        &mut self,
        symbol: &str,
        data: &MarketDataUpdate,
        _prediction: Option<&ModelPrediction>,
    ) -> Signal {
        let (Some(short_ma), Some(long_ma)) = (
            self.moving_average(self.config.short_window),
            self.moving_average(self.config.long_window),
        ) else {
            debug!("[{symbol}] Not enough data for MA calculation");
            return Signal::hold(symbol);
        };

        debug!("[{symbol}] short_ma={short_ma:.4}, long_ma={long_ma:.4}");
        if short_ma > long_ma {
            let Some(ask) = data.best_ask().or(data.last_trade) else {
                return Signal::hold(symbol);
            };
            let stop = ask * (1.0 - self.config.stop_loss_pct);
            self.sized(Signal::buy(symbol, ask, 0.0).with_stop_loss(stop))
        } else if short_ma < long_ma {
            let Some(bid) = data.best_bid().or(data.last_trade) else {
                return Signal::hold(symbol);
            };
            let stop = bid * (1.0 + self.config.stop_loss_pct);
            self.sized(Signal::sell(symbol, bid, 0.0).with_stop_loss(stop))
        } else {
            Signal::hold(symbol)
        }
    }

    fn update_parameters(&mut self, params: &StrategyParams) {
        if let Some(&w) = params.get("short_window") {
            if w >= 1.0 {
                self.config.short_window = w as usize;
            }
        }
        if let Some(&w) = params.get("long_window") {
            if w >= 1.0 {
                self.config.long_window = w as usize;
            }
        }
        if let Some(&n) = params.get("trade_notional") {
            if n.is_finite() && n > 0.0 {
                self.config.trade_notional = n;
            }
        }
        if let Some(&p) = params.get("stop_loss_pct") {
            if p.is_finite() && p > 0.0 {
                self.config.stop_loss_pct = p;
            }
        }
        info!(
            "Momentum parameters updated: short_window={}, long_window={}",
            self.config.short_window, self.config.long_window
        );
    }
}
