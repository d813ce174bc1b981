use serde::{Deserialize, Serialize};

/// Below this absolute size a position counts as flat.
pub const FLAT_EPSILON: f64 = 1e-9;

/// The engine's position in a single trading symbol
///
/// `size` is signed: positive = long, negative = short, zero = flat.
/// `entry_price` is the volume-weighted average cost of the open size and
/// is meaningful only while the position is open; any transition through
/// flat resets it to zero. `realized_pnl` accumulates on closing or
/// reducing fills only. `unrealized_pnl` is derived from a mark price and
/// never treated as authoritative state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub size: f64,
    pub entry_price: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    /// Epoch seconds of the last applied fill
    pub last_update_time: f64,
}

impl Position {
    /// Create a flat position for a symbol
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            size: 0.0,
            entry_price: 0.0,
            realized_pnl: 0.0,
            unrealized_pnl: 0.0,
            last_update_time: 0.0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.size.abs() < FLAT_EPSILON
    }

    pub fn is_long(&self) -> bool {
        self.size >= FLAT_EPSILON
    }

    pub fn is_short(&self) -> bool {
        self.size <= -FLAT_EPSILON
    }

    /// Apply a fill to this position, returning the realized PnL delta.
    ///
    /// Callers must validate `signed_quantity` and `price` for NaN/infinity
    /// before calling; this method only performs position arithmetic.
    ///
    /// Four cases:
    /// - exact close: realize PnL on the whole closed size, reset to flat
    /// - same direction (or opening from flat): volume-weighted entry price
    /// - reduce without closing: realize PnL on the reduced portion, keep entry
    /// - flip: realize PnL on the full old size, remainder opens at fill price
    pub fn apply_fill(&mut self, signed_quantity: f64, price: f64, timestamp: f64) -> f64 {
        let old_size = self.size;
        let new_size = old_size + signed_quantity;
        let mut realized = 0.0;

        if new_size.abs() < FLAT_EPSILON {
            // Exact close
            realized = (price - self.entry_price) * old_size;
            self.size = 0.0;
            self.entry_price = 0.0;
        } else if old_size.abs() < FLAT_EPSILON
            || (old_size > 0.0) == (signed_quantity > 0.0)
        {
            // Opening from flat or adding in the same direction
            let old_value = old_size * self.entry_price;
            let new_value = signed_quantity * price;
            self.entry_price = (old_value + new_value) / new_size;
            self.size = new_size;
        } else if (old_size > 0.0) != (new_size > 0.0) {
            // Flip: realize the whole old size, remainder is a fresh open
            realized = (price - self.entry_price) * old_size;
            self.entry_price = price;
            self.size = new_size;
        } else {
            // Reduce without closing: realize the reduced portion, keep entry
            let closed = -signed_quantity;
            realized = (price - self.entry_price) * closed;
            self.size = new_size;
        }

        self.realized_pnl += realized;
        self.last_update_time = timestamp;
        realized
    }

    /// Unrealized PnL at a mark price, or None when flat or the mark is invalid
    pub fn unrealized_at(&self, mark_price: f64) -> Option<f64> {
        if self.is_flat() || !mark_price.is_finite() {
            return None;
        }
        Some((mark_price - self.entry_price) * self.size)
    }

    /// Total PnL at a mark price, always recomputed (never drifted)
    pub fn total_pnl(&self, mark_price: f64) -> f64 {
        self.realized_pnl + self.unrealized_at(mark_price).unwrap_or(0.0)
    }

    /// Notional value of the open size at a mark price
    pub fn notional_value(&self, mark_price: f64) -> f64 {
        self.size * mark_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-6;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < TOL
    }

    #[test]
    fn test_open_from_flat() {
        let mut pos = Position::new("BTC/USDT");
        let realized = pos.apply_fill(0.1, 100.0, 1.0);

        assert_eq!(realized, 0.0);
        assert!(approx(pos.size, 0.1));
        assert!(approx(pos.entry_price, 100.0));
        assert_eq!(pos.last_update_time, 1.0);
    }

    #[test]
    fn test_entry_price_is_volume_weighted_average() {
        let mut pos = Position::new("BTC/USDT");
        pos.apply_fill(0.1, 100.0, 1.0);
        pos.apply_fill(0.2, 110.0, 2.0);

        assert!(approx(pos.size, 0.3));
        // (0.1*100 + 0.2*110) / 0.3 = 106.666...
        assert!(approx(pos.entry_price, 106.666_666_666_7));
    }

    #[test]
    fn test_reduce_realizes_pnl_keeps_entry() {
        let mut pos = Position::new("BTC/USDT");
        pos.apply_fill(0.1, 100.0, 1.0);
        pos.apply_fill(0.2, 110.0, 2.0);
        let entry = pos.entry_price;

        let realized = pos.apply_fill(-0.15, 120.0, 3.0);

        assert!(approx(pos.size, 0.15));
        assert!(approx(pos.entry_price, entry));
        assert!(approx(realized, (120.0 - entry) * 0.15));
        assert!(approx(pos.realized_pnl, (120.0 - entry) * 0.15));
    }

    #[test]
    fn test_exact_close_resets_entry() {
        let mut pos = Position::new("BTC/USDT");
        pos.apply_fill(0.5, 200.0, 1.0);
        let realized = pos.apply_fill(-0.5, 210.0, 2.0);

        assert_eq!(pos.size, 0.0);
        assert_eq!(pos.entry_price, 0.0);
        assert!(pos.is_flat());
        assert!(approx(realized, 5.0));
    }

    #[test]
    fn test_flip_resets_entry_to_fill_price() {
        let mut pos = Position::new("BTC/USDT");
        pos.apply_fill(0.1, 100.0, 1.0);
        let realized = pos.apply_fill(-0.3, 110.0, 2.0);

        assert!(approx(pos.size, -0.2));
        assert!(approx(pos.entry_price, 110.0));
        // Realized on the old 0.1 long: (110 - 100) * 0.1 = 1.0
        assert!(approx(realized, 1.0));
        assert!(pos.is_short());
    }

    #[test]
    fn test_short_reduce_realizes_pnl() {
        let mut pos = Position::new("ETH/USDT");
        pos.apply_fill(-1.0, 3_000.0, 1.0);
        // Buy back half at 2 900: profit (3 000 - 2 900) * 0.5 = 50
        let realized = pos.apply_fill(0.5, 2_900.0, 2.0);

        assert!(approx(pos.size, -0.5));
        assert!(approx(pos.entry_price, 3_000.0));
        assert!(approx(realized, 50.0));
    }

    #[test]
    fn test_unrealized_pnl() {
        let mut pos = Position::new("BTC/USDT");
        pos.apply_fill(0.2, 100.0, 1.0);

        assert!(approx(pos.unrealized_at(110.0).unwrap(), 2.0));
        assert!(approx(pos.total_pnl(110.0), 2.0));
        assert!(pos.unrealized_at(f64::NAN).is_none());

        pos.apply_fill(-0.2, 110.0, 2.0);
        assert!(pos.unrealized_at(110.0).is_none());
        assert!(approx(pos.total_pnl(110.0), 2.0));
    }

    #[test]
    fn test_scale_in_then_partial_close() {
        let mut pos = Position::new("BTC/USDT");
        pos.apply_fill(0.1, 100.0, 1.0);
        assert!(approx(pos.size, 0.1));
        assert!(approx(pos.entry_price, 100.0));

        pos.apply_fill(0.2, 110.0, 2.0);
        assert!(approx(pos.size, 0.3));
        assert!((pos.entry_price - 106.67).abs() < 0.01);

        let entry = pos.entry_price;
        pos.apply_fill(-0.15, 120.0, 3.0);
        assert!(approx(pos.size, 0.15));
        assert!((pos.entry_price - 106.67).abs() < 0.01);
        assert!(approx(pos.realized_pnl, (120.0 - entry) * 0.15));
    }
}
