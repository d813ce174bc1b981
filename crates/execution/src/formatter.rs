use crate::error::FormattingError;
use helm_core::Signal;
use helm_ports::{MarketMetadata, PrecisionRule};
use log::{debug, warn};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;

/// Formats order parameters to exchange precision rules.
///
/// Quantities always round DOWN (never submit more than the strategy
/// sized), prices round to the nearest tick. Missing metadata is
/// permissive: values pass through unrounded and the minimum-size check
/// assumes the order is fine.
pub struct OrderFormatter {
    metadata: Arc<dyn MarketMetadata>,
}

impl OrderFormatter {
    pub fn new(metadata: Arc<dyn MarketMetadata>) -> Self {
        Self { metadata }
    }

    /// Round an order quantity down to the symbol's amount precision.
    pub fn format_quantity(&self, symbol: &str, quantity: f64) -> Result<f64, FormattingError> {
        if !quantity.is_finite() {
            return Err(FormattingError::InvalidQuantity {
                symbol: symbol.to_string(),
                value: quantity,
            });
        }

        let rule = self.metadata.precision(symbol).and_then(|p| p.amount);
        let Some(rule) = rule else {
            debug!("[{symbol}] No amount precision, using original qty {quantity}");
            return Ok(quantity);
        };

        let qty = to_decimal(symbol, quantity)?;
        let formatted = match rule {
            PrecisionRule::DecimalPlaces(dp) => qty.trunc_with_scale(dp),
            PrecisionRule::StepSize(step) => {
                let Some(step) = positive_step(symbol, step) else {
                    return Ok(quantity);
                };
                (qty / step).floor() * step
            }
        };
        let formatted = from_decimal(symbol, formatted)?;
        debug!("[{symbol}] Qty {quantity} -> {formatted}");
        Ok(formatted)
    }

    /// Round an order price to the nearest tick of the symbol's price
    /// precision.
    pub fn format_price(&self, symbol: &str, price: f64) -> Result<f64, FormattingError> {
        if !price.is_finite() {
            return Err(FormattingError::InvalidPrice {
                symbol: symbol.to_string(),
                value: price,
            });
        }

        let rule = self.metadata.precision(symbol).and_then(|p| p.price);
        let Some(rule) = rule else {
            debug!("[{symbol}] No price precision, using original price {price}");
            return Ok(price);
        };

        let p = to_decimal(symbol, price)?;
        let formatted = match rule {
            PrecisionRule::DecimalPlaces(dp) => {
                p.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
            }
            PrecisionRule::StepSize(step) => {
                let Some(step) = positive_step(symbol, step) else {
                    return Ok(price);
                };
                (p / step).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero) * step
            }
        };
        let formatted = from_decimal(symbol, formatted)?;
        debug!("[{symbol}] Price {price} -> {formatted}");
        Ok(formatted)
    }

    /// Does the order meet the symbol's minimum amount and cost limits?
    ///
    /// Permissive on missing data: no limits means OK, and the cost check
    /// is skipped when no usable price is available. Non-finite inputs
    /// always fail.
    pub fn check_min_order_size(&self, symbol: &str, quantity: f64, price: Option<f64>) -> bool {
        if !quantity.is_finite() || price.is_some_and(|p| !p.is_finite()) {
            warn!("[{symbol}] Invalid inputs for min size check: qty={quantity}, price={price:?}");
            return false;
        }

        let Some(limits) = self.metadata.limits(symbol) else {
            debug!("[{symbol}] No limits info, assuming order size OK");
            return true;
        };

        if let Some(min_amount) = limits.min_amount {
            if quantity < min_amount {
                warn!("[{symbol}] Qty {quantity} below min amount {min_amount}");
                return false;
            }
        }

        if let Some(min_cost) = limits.min_cost {
            match price {
                Some(p) if p > 0.0 => {
                    let cost = quantity * p;
                    if cost < min_cost {
                        warn!("[{symbol}] Cost {cost:.4} below min cost {min_cost}");
                        return false;
                    }
                }
                _ => warn!("[{symbol}] Skipping min cost check, no usable price"),
            }
        }

        true
    }

    /// Format a full signal for submission: quantity rounded down, price
    /// rounded to tick, then the minimum-size check against the rounded
    /// values. Hold signals pass through untouched.
    pub fn format_signal(&self, signal: &Signal) -> Result<Signal, FormattingError> {
        if signal.is_hold() {
            return Ok(signal.clone());
        }

        let quantity = self.format_quantity(&signal.symbol, signal.quantity)?;
        let price = self.format_price(&signal.symbol, signal.price)?;

        if !self.check_min_order_size(&signal.symbol, quantity, Some(price)) {
            return Err(FormattingError::BelowMinimumSize {
                symbol: signal.symbol.clone(),
                quantity,
                price: Some(price),
            });
        }

        let mut formatted = signal.clone();
        formatted.quantity = quantity;
        formatted.price = price;
        Ok(formatted)
    }
}

fn to_decimal(symbol: &str, value: f64) -> Result<Decimal, FormattingError> {
    Decimal::from_f64(value).ok_or_else(|| FormattingError::Unrepresentable {
        symbol: symbol.to_string(),
        value,
    })
}

fn from_decimal(symbol: &str, value: Decimal) -> Result<f64, FormattingError> {
    value.to_f64().ok_or_else(|| FormattingError::Unrepresentable {
        symbol: symbol.to_string(),
        value: 0.0,
    })
}

fn positive_step(symbol: &str, step: f64) -> Option<Decimal> {
    match Decimal::from_f64(step) {
        Some(step) if step > Decimal::ZERO => Some(step),
        _ => {
            warn!("[{symbol}] Unusable step size {step}, skipping rounding");
            None
        }
    }
}
