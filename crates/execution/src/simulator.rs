use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use helm_core::{OrderType, Signal, SignalAction};
use helm_ports::{ExecutionReport, ExecutionStatus, OrderSubmitter, SubmissionError};
use log::{debug, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use uuid::Uuid;

/// Order submitter that fills against a shared mark-price board.
///
/// Limit orders fill at the mark when they cross it (buy at or above,
/// sell at or below), market orders fill at the mark unconditionally.
/// Without a mark for the symbol the order rests open. No order book,
/// no partial fills.
pub struct SimulatedSubmitter {
    marks: Arc<DashMap<String, f64>>,
    initialized: AtomicBool,
    fill_latency_ms: u64,
}

impl SimulatedSubmitter {
    pub fn new() -> Self {
        Self {
            marks: Arc::new(DashMap::new()),
            initialized: AtomicBool::new(false),
            fill_latency_ms: 0,
        }
    }

    /// Simulated exchange round-trip latency per submission
    pub fn with_fill_latency(mut self, latency_ms: u64) -> Self {
        self.fill_latency_ms = latency_ms;
        self
    }

    /// Set the current mark price used to decide fills for a symbol
    pub fn set_mark(&self, symbol: impl Into<String>, price: f64) {
        self.marks.insert(symbol.into(), price);
    }

    /// Shared handle to the mark board, for feeds that publish prices
    pub fn marks(&self) -> Arc<DashMap<String, f64>> {
        Arc::clone(&self.marks)
    }

    fn simulate_fill(&self, signal: &Signal, mark: Option<f64>) -> (ExecutionStatus, f64, f64) {
        match signal.order_type {
            OrderType::Limit => match mark {
                Some(mark) => {
                    let crosses = match signal.action {
                        SignalAction::Buy => signal.price >= mark,
                        SignalAction::Sell => signal.price <= mark,
                        SignalAction::Hold => false,
                    };
                    if crosses {
                        (ExecutionStatus::Closed, signal.quantity, mark)
                    } else {
                        (ExecutionStatus::Open, 0.0, signal.price)
                    }
                }
                None => {
                    warn!(
                        "[{}] No mark price, limit order rests open",
                        signal.symbol
                    );
                    (ExecutionStatus::Open, 0.0, signal.price)
                }
            },
            OrderType::Market => match mark {
                Some(mark) => (ExecutionStatus::Closed, signal.quantity, mark),
                None => {
                    warn!(
                        "[{}] No mark price, cannot fill market order, leaving open",
                        signal.symbol
                    );
                    (ExecutionStatus::Open, 0.0, signal.price)
                }
            },
        }
    }
}

impl Default for SimulatedSubmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderSubmitter for SimulatedSubmitter {
    async fn initialize(&self) -> Result<(), SubmissionError> {
        info!("Simulated submitter initialized");
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn submit(&self, signal: &Signal) -> Result<ExecutionReport, SubmissionError> {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(SubmissionError::NotInitialized);
        }
        if !signal.is_executable() {
            return Err(SubmissionError::InvalidParameters(format!(
                "[{}] qty={}, price={}",
                signal.symbol, signal.quantity, signal.price
            )));
        }

        if self.fill_latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.fill_latency_ms)).await;
        }

        let mark = self.marks.get(&signal.symbol).map(|entry| *entry);
        let (status, filled_qty, average_price) = self.simulate_fill(signal, mark);

        let report = ExecutionReport {
            order_id: format!("sim-{}", Uuid::new_v4()),
            status,
            filled_qty,
            average_price,
            timestamp: Utc::now().timestamp_millis() as f64 / 1000.0,
        };
        debug!(
            "[{}] Simulated {:?} order {}: {:?}, filled {} @ {}",
            signal.symbol,
            signal.order_type,
            report.order_id,
            report.status,
            report.filled_qty,
            report.average_price
        );
        Ok(report)
    }

    async fn close(&self) {
        info!("Simulated submitter closed");
        self.initialized.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_before_initialize_fails() {
        let submitter = SimulatedSubmitter::new();
        let err = submitter
            .submit(&Signal::buy("BTC/USDT", 100.0, 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::NotInitialized));
    }

    #[tokio::test]
    async fn test_limit_buy_fills_when_crossing() {
        let submitter = SimulatedSubmitter::new();
        submitter.initialize().await.unwrap();
        submitter.set_mark("BTC/USDT", 99.5);

        let report = submitter
            .submit(&Signal::buy("BTC/USDT", 100.0, 0.5))
            .await
            .unwrap();
        assert_eq!(report.status, ExecutionStatus::Closed);
        assert_eq!(report.filled_qty, 0.5);
        // Fills at the mark, not at the limit price
        assert_eq!(report.average_price, 99.5);
        assert!(report.order_id.starts_with("sim-"));
    }

    #[tokio::test]
    async fn test_limit_buy_rests_when_below_mark() {
        let submitter = SimulatedSubmitter::new();
        submitter.initialize().await.unwrap();
        submitter.set_mark("BTC/USDT", 101.0);

        let report = submitter
            .submit(&Signal::buy("BTC/USDT", 100.0, 0.5))
            .await
            .unwrap();
        assert_eq!(report.status, ExecutionStatus::Open);
        assert_eq!(report.filled_qty, 0.0);
        assert!(report.fill().is_none());
    }

    #[tokio::test]
    async fn test_limit_sell_fills_when_crossing() {
        let submitter = SimulatedSubmitter::new();
        submitter.initialize().await.unwrap();
        submitter.set_mark("ETH/USDT", 3_010.0);

        let report = submitter
            .submit(&Signal::sell("ETH/USDT", 3_000.0, 2.0))
            .await
            .unwrap();
        assert_eq!(report.status, ExecutionStatus::Closed);
        assert_eq!(report.average_price, 3_010.0);
    }

    #[tokio::test]
    async fn test_market_order_fills_at_mark() {
        let submitter = SimulatedSubmitter::new();
        submitter.initialize().await.unwrap();
        submitter.set_mark("BTC/USDT", 102.0);

        let signal = Signal::buy("BTC/USDT", 100.0, 1.0).with_order_type(OrderType::Market);
        let report = submitter.submit(&signal).await.unwrap();
        assert_eq!(report.status, ExecutionStatus::Closed);
        assert_eq!(report.average_price, 102.0);
    }

    #[tokio::test]
    async fn test_no_mark_leaves_order_open() {
        let submitter = SimulatedSubmitter::new();
        submitter.initialize().await.unwrap();

        let limit = submitter
            .submit(&Signal::buy("BTC/USDT", 100.0, 1.0))
            .await
            .unwrap();
        assert_eq!(limit.status, ExecutionStatus::Open);

        let market = submitter
            .submit(&Signal::buy("BTC/USDT", 100.0, 1.0).with_order_type(OrderType::Market))
            .await
            .unwrap();
        assert_eq!(market.status, ExecutionStatus::Open);
    }

    #[tokio::test]
    async fn test_invalid_parameters_rejected() {
        let submitter = SimulatedSubmitter::new();
        submitter.initialize().await.unwrap();

        let err = submitter
            .submit(&Signal::buy("BTC/USDT", 100.0, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::InvalidParameters(_)));
    }

    #[tokio::test]
    async fn test_close_deinitializes() {
        let submitter = SimulatedSubmitter::new();
        submitter.initialize().await.unwrap();
        submitter.close().await;

        let err = submitter
            .submit(&Signal::buy("BTC/USDT", 100.0, 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::NotInitialized));
    }
}
