use crate::error::SubmissionError;
use async_trait::async_trait;
use helm_core::Signal;
use serde::{Deserialize, Serialize};

/// Exchange-side status of a submitted order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Resting on the book, no fill yet
    Open,
    /// Fully executed
    Closed,
    /// Refused by the exchange
    Rejected,
}

/// Result of an order submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Exchange (or simulator) order id
    pub order_id: String,
    pub status: ExecutionStatus,
    /// Executed quantity, unsigned
    pub filled_qty: f64,
    /// Average execution price over the filled quantity
    pub average_price: f64,
    /// Epoch seconds of the report
    pub timestamp: f64,
}

/// An executed quantity at a price, extracted from a report
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    /// Unsigned executed quantity
    pub quantity: f64,
    pub price: f64,
    pub timestamp: f64,
}

impl ExecutionReport {
    /// The confirmed fill, if the order fully executed.
    ///
    /// Open and rejected orders carry no fill; callers must never apply
    /// position updates for them.
    pub fn fill(&self) -> Option<Fill> {
        if self.status == ExecutionStatus::Closed && self.filled_qty > 0.0 {
            Some(Fill {
                quantity: self.filled_qty,
                price: self.average_price,
                timestamp: self.timestamp,
            })
        } else {
            None
        }
    }
}

/// Boundary to the exchange.
///
/// The scheduler is the only caller: it submits an approved, formatted
/// signal and applies the resulting fill to the position store exactly
/// once. Implementations may talk to a real exchange or simulate fills;
/// the core treats both identically.
#[async_trait]
pub trait OrderSubmitter: Send + Sync {
    /// Connect/authenticate. Called once at engine startup; failure here
    /// is fatal to the whole engine.
    async fn initialize(&self) -> Result<(), SubmissionError>;

    /// Submit an order for an executable signal.
    async fn submit(&self, signal: &Signal) -> Result<ExecutionReport, SubmissionError>;

    /// Release any held resources. Called last during shutdown.
    async fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_only_when_closed() {
        let report = ExecutionReport {
            order_id: "x".to_string(),
            status: ExecutionStatus::Open,
            filled_qty: 1.0,
            average_price: 100.0,
            timestamp: 0.0,
        };
        assert!(report.fill().is_none());

        let report = ExecutionReport {
            status: ExecutionStatus::Closed,
            ..report
        };
        let fill = report.fill().unwrap();
        assert_eq!(fill.quantity, 1.0);
        assert_eq!(fill.price, 100.0);
    }

    #[test]
    fn test_zero_filled_closed_has_no_fill() {
        let report = ExecutionReport {
            order_id: "x".to_string(),
            status: ExecutionStatus::Closed,
            filled_qty: 0.0,
            average_price: 0.0,
            timestamp: 0.0,
        };
        assert!(report.fill().is_none());
    }
}
