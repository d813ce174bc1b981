use serde::{Deserialize, Serialize};

/// A market data update for one symbol
///
/// Shape matches what the data-ingestion boundary delivers: top-of-book
/// levels as (price, quantity) pairs plus an optional last trade price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDataUpdate {
    /// Epoch seconds
    pub timestamp: f64,
    /// Bid levels, best first
    pub bids: Vec<(f64, f64)>,
    /// Ask levels, best first
    pub asks: Vec<(f64, f64)>,
    /// Last traded price, if known
    pub last_trade: Option<f64>,
}

impl MarketDataUpdate {
    pub fn best_bid(&self) -> Option<f64> {
        self.bids
            .first()
            .map(|(price, _)| *price)
            .filter(|p| p.is_finite() && *p > 0.0)
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks
            .first()
            .map(|(price, _)| *price)
            .filter(|p| p.is_finite() && *p > 0.0)
    }

    /// Mid price from the best bid/ask, falling back to the last trade.
    ///
    /// Returns None when neither yields a finite positive price.
    pub fn mid_price(&self) -> Option<f64> {
        if let (Some(bid), Some(ask)) = (self.best_bid(), self.best_ask()) {
            let mid = (bid + ask) / 2.0;
            if mid.is_finite() && mid > 0.0 {
                return Some(mid);
            }
        }
        self.last_trade.filter(|p| p.is_finite() && *p > 0.0)
    }
}

/// Optional model output handed to a strategy alongside market data.
///
/// The core never interprets this; strategies are free to ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPrediction {
    pub predicted_price: f64,
    /// Model conviction in [0, 1]
    pub confidence: f64,
}
