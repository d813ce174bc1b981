use thiserror::Error;

/// Errors from order formatting.
///
/// A formatting error aborts the trade cycle for this signal; nothing is
/// submitted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormattingError {
    #[error("[{symbol}] Invalid quantity for formatting: {value}")]
    InvalidQuantity { symbol: String, value: f64 },

    #[error("[{symbol}] Invalid price for formatting: {value}")]
    InvalidPrice { symbol: String, value: f64 },

    #[error("[{symbol}] Value {value} not representable as a decimal")]
    Unrepresentable { symbol: String, value: f64 },

    #[error("[{symbol}] Order below minimum size: qty={quantity}, price={price:?}")]
    BelowMinimumSize {
        symbol: String,
        quantity: f64,
        price: Option<f64>,
    },
}
