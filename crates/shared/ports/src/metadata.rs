use serde::{Deserialize, Serialize};

/// How an exchange expresses precision for one dimension of an order.
///
/// Exchanges publish either a number of decimal places or a step size;
/// both appear in the wild and must be handled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PrecisionRule {
    DecimalPlaces(u32),
    StepSize(f64),
}

/// Precision metadata for a symbol
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SymbolPrecision {
    /// Precision for order quantity (base amount)
    pub amount: Option<PrecisionRule>,
    /// Precision for order price
    pub price: Option<PrecisionRule>,
}

/// Minimum order limits for a symbol
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SymbolLimits {
    /// Minimum order quantity in base units
    pub min_amount: Option<f64>,
    /// Minimum order notional (quantity * price) in quote units
    pub min_cost: Option<f64>,
}

/// Exchange market metadata: precision and minimum-size rules per symbol.
///
/// Absence of metadata is not an error; the formatter passes values
/// through unrounded and the minimum-size check stays permissive.
pub trait MarketMetadata: Send + Sync {
    fn precision(&self, symbol: &str) -> Option<SymbolPrecision>;

    fn limits(&self, symbol: &str) -> Option<SymbolLimits>;
}
