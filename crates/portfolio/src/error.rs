use thiserror::Error;

/// A fill carrying NaN or infinite numeric data.
///
/// The fill is dropped and logged; position state is left untouched.
/// Never fatal.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid fill for {symbol}: quantity={quantity}, price={price}")]
pub struct InvalidFillError {
    pub symbol: String,
    pub quantity: f64,
    pub price: f64,
}
