use crate::traits::{Strategy, StrategyParams};
use helm_core::{MarketDataUpdate, ModelPrediction, Signal};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Mean reversion strategy parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeanReversionConfig {
    /// Rolling window length, in updates
    pub window_size: usize,
    /// Z-score magnitude required to trade
    pub std_dev_threshold: f64,
    /// Target order size in quote currency
    pub trade_notional: f64,
    /// Protective stop distance as a fraction of entry price
    pub stop_loss_pct: f64,
}

impl Default for MeanReversionConfig {
    fn default() -> Self {
        Self {
            window_size: 20,
            std_dev_threshold: 1.5,
            trade_notional: 100.0,
            stop_loss_pct: 0.02,
        }
    }
}

/// Z-score mean reversion strategy.
///
/// Sells when the last trade sits more than `std_dev_threshold` standard
/// deviations above the rolling mean, buys when below. Holds until the
/// window is full or when the band is degenerate (zero deviation).
#[derive(Debug)]
pub struct MeanReversionStrategy {
    config: MeanReversionConfig,
    prices: VecDeque<f64>,
}

impl MeanReversionStrategy {
    pub fn new(config: MeanReversionConfig) -> Self {
        info!(
            "MeanReversion strategy initialized: window_size={}, std_dev_threshold={}",
            config.window_size, config.std_dev_threshold
        );
        Self {
            prices: VecDeque::with_capacity(config.window_size),
            config,
        }
    }

    fn rolling_stats(&self) -> Option<(f64, f64)> {
        if self.prices.len() < self.config.window_size {
            return None;
        }
        let n = self.prices.len() as f64;
        let mean = self.prices.iter().sum::<f64>() / n;
        let variance = self
            .prices
            .iter()
            .map(|p| (p - mean).powi(2))
            .sum::<f64>()
            / n;
        Some((mean, variance.sqrt()))
    }

    fn sized(&self, signal: Signal) -> Signal {
        let quantity = self.config.trade_notional / signal.price;
        signal.with_quantity(quantity)
    }
}

impl Strategy for MeanReversionStrategy {
    fn name(&self) -> &'static str {
        "mean_reversion"
    }

    fn on_market_update(&mut self, data: &MarketDataUpdate) {
        if let Some(price) = data.last_trade.filter(|p| p.is_finite() && *p > 0.0) {
            if self.prices.len() == self.config.window_size {
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
        let Some((mean, std)) = self.rolling_stats() else {
            debug!("[{symbol}] Not enough data for mean calculation");
            return Signal::hold(symbol);
        };
        let Some(price) = data.last_trade.filter(|p| p.is_finite() && *p > 0.0) else {
            return Signal::hold(symbol);
        };
        if std <= 0.0 {
            return Signal::hold(symbol);
        }

        let upper = mean + self.config.std_dev_threshold * std;
        let lower = mean - self.config.std_dev_threshold * std;
        debug!(
            "[{symbol}] price={price:.4}, mean={mean:.4}, std={std:.4}, upper={upper:.4}, lower={lower:.4}"
        );

        if price > upper {
            let bid = data.best_bid().unwrap_or(price);
            let stop = bid * (1.0 + self.config.stop_loss_pct);
            self.sized(Signal::sell(symbol, bid, 0.0).with_stop_loss(stop))
        } else if price < lower {
            let ask = data.best_ask().unwrap_or(price);
            let stop = ask * (1.0 - self.config.stop_loss_pct);
            self.sized(Signal::buy(symbol, ask, 0.0).with_stop_loss(stop))
        } else {
            Signal::hold(symbol)
        }
    }

    fn update_parameters(&mut self, params: &StrategyParams) {
        if let Some(&w) = params.get("window_size") {
            if w >= 2.0 {
                self.config.window_size = w as usize;
            }
        }
        if let Some(&t) = params.get("std_dev_threshold") {
            if t.is_finite() && t > 0.0 {
                self.config.std_dev_threshold = t;
            }
        }
        if let Some(&n) = params.get("trade_notional") {
            if n.is_finite() && n > 0.0 {
                self.config.trade_notional = n;
            }
        }
        info!(
            "MeanReversion parameters updated: window_size={}, std_dev_threshold={}",
            self.config.window_size, self.config.std_dev_threshold
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helm_core::SignalAction;

    fn update(last: f64) -> MarketDataUpdate {
        MarketDataUpdate {
            timestamp: 0.0,
            bids: vec![(last - 0.5, 1.0)],
            asks: vec![(last + 0.5, 1.0)],
            last_trade: Some(last),
        }
    }

    fn strategy() -> MeanReversionStrategy {
        MeanReversionStrategy::new(MeanReversionConfig {
            window_size: 4,
            std_dev_threshold: 1.5,
            trade_notional: 100.0,
            stop_loss_pct: 0.02,
        })
    }

    #[test]
    fn test_holds_until_window_full() {
        let mut s = strategy();
        for price in [100.0, 100.0, 100.0] {
            s.on_market_update(&update(price));
        }
        assert!(s.generate_signal("BTC/USDT", &update(100.0), None).is_hold());
    }

    #[test]
    fn test_spike_above_band_sells() {
        let mut s = strategy();
        // mean 100.75, std ~1.299; upper band ~102.70
        for price in [100.0, 100.0, 100.0, 103.0] {
            s.on_market_update(&update(price));
        }
        let signal = s.generate_signal("BTC/USDT", &update(103.0), None);
        assert_eq!(signal.action, SignalAction::Sell);
        assert_eq!(signal.price, 102.5);
        assert!((signal.quantity - 100.0 / 102.5).abs() < 1e-12);
    }

    #[test]
    fn test_drop_below_band_buys() {
        let mut s = strategy();
        for price in [100.0, 100.0, 100.0, 97.0] {
            s.on_market_update(&update(price));
        }
        let signal = s.generate_signal("BTC/USDT", &update(97.0), None);
        assert_eq!(signal.action, SignalAction::Buy);
        assert_eq!(signal.price, 97.5);
        assert!(signal.stop_loss.unwrap() < 97.5);
    }

    #[test]
    fn test_inside_band_holds() {
        let mut s = strategy();
        for price in [100.0, 101.0, 99.0, 100.5] {
            s.on_market_update(&update(price));
        }
        assert!(s.generate_signal("BTC/USDT", &update(100.5), None).is_hold());
    }

    #[test]
    fn test_flat_window_holds() {
        let mut s = strategy();
        // Zero standard deviation: band is degenerate, never trade
        for _ in 0..4 {
            s.on_market_update(&update(100.0));
        }
        assert!(s.generate_signal("BTC/USDT", &update(100.0), None).is_hold());
    }
}
