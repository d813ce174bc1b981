use crate::manager::TradingManager;
use chrono::Utc;
use dashmap::DashMap;
use helm_core::MarketDataUpdate;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Random-walk market data generator for running the engine without a
/// live venue. One top-of-book level per side plus a last trade.
pub struct SimulatedFeed {
    symbols: Vec<String>,
    interval: Duration,
    start_price: f64,
    mark_sink: Option<Arc<DashMap<String, f64>>>,
}

impl SimulatedFeed {
    pub fn new(symbols: Vec<String>, interval: Duration) -> Self {
        Self {
            symbols,
            interval,
            start_price: 50_000.0,
            mark_sink: None,
        }
    }

    pub fn with_start_price(mut self, price: f64) -> Self {
        self.start_price = price;
        self
    }

    /// Also publish each price into an external mark board, typically the
    /// simulated submitter's fill-price source
    pub fn with_mark_sink(mut self, sink: Arc<DashMap<String, f64>>) -> Self {
        self.mark_sink = Some(sink);
        self
    }

    /// Publish updates into the manager until it stops running
    pub fn spawn(self, manager: Arc<TradingManager>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Simulated feed started for {:?}", self.symbols);
            let mut rng = StdRng::from_entropy();
            let mut prices: Vec<(String, f64)> = self
                .symbols
                .iter()
                .enumerate()
                .map(|(i, s)| (s.clone(), self.start_price * (1.0 + i as f64 * 0.1)))
                .collect();

            while manager.is_running() {
                for (symbol, price) in prices.iter_mut() {
                    *price *= 1.0 + rng.gen_range(-0.002..0.002);
                    if let Some(sink) = &self.mark_sink {
                        sink.insert(symbol.clone(), *price);
                    }
                    let spread = (*price * 0.0001).max(0.01);
                    let update = MarketDataUpdate {
                        timestamp: Utc::now().timestamp_millis() as f64 / 1000.0,
                        bids: vec![(*price - spread / 2.0, 1.0)],
                        asks: vec![(*price + spread / 2.0, 1.0)],
                        last_trade: Some(*price),
                    };
                    manager.on_market_update(symbol, update);
                }
                tokio::time::sleep(self.interval).await;
            }
            info!("Simulated feed stopped");
        })
    }
}
