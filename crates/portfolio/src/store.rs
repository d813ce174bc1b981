use crate::error::InvalidFillError;
use helm_core::{FLAT_EPSILON, PortfolioSnapshot, Position};
use helm_ports::StateStore;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Owns and tracks all positions across symbols.
///
/// The map is the only state mutated by more than one concurrent trade
/// cycle (different symbols, disjoint keys); the lock also keeps
/// cross-symbol snapshots (open-position count, portfolio value) from
/// racing with fills on other symbols. Positions are created lazily on
/// first fill and never deleted — flat entries keep their realized PnL
/// for audit continuity.
pub struct PositionStore {
    positions: RwLock<HashMap<String, Position>>,
    store: Option<Arc<dyn StateStore>>,
    key_prefix: String,
}

impl PositionStore {
    /// In-memory only, no persistence
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            positions: RwLock::new(HashMap::new()),
            store: None,
            key_prefix: format!("{}:position:", namespace.into()),
        }
    }

    /// With persistence to an external state store
    pub fn with_persistence(namespace: impl Into<String>, store: Arc<dyn StateStore>) -> Self {
        Self {
            positions: RwLock::new(HashMap::new()),
            store: Some(store),
            key_prefix: format!("{}:position:", namespace.into()),
        }
    }

    /// Load all persisted positions into memory.
    ///
    /// Called once at startup. Malformed entries are logged and skipped;
    /// a failed scan leaves the store empty but usable.
    pub async fn load(&self) {
        let Some(store) = &self.store else {
            return;
        };

        let entries = match store.scan(&self.key_prefix).await {
            Ok(entries) => entries,
            Err(e) => {
                error!("Failed to scan persisted positions: {}", e);
                return;
            }
        };

        let mut loaded = 0usize;
        {
            let mut positions = self.positions.write().unwrap_or_else(|e| e.into_inner());
            for (key, value) in entries {
                match serde_json::from_str::<Position>(&value) {
                    Ok(position) => {
                        positions.insert(position.symbol.clone(), position);
                        loaded += 1;
                    }
                    Err(e) => {
                        error!("Failed to decode persisted position under {}: {}", key, e);
                    }
                }
            }
        }
        info!("Loaded {} persisted positions", loaded);
    }

    /// Apply a confirmed fill to the position for `symbol`.
    ///
    /// Rejects NaN/infinite quantity or price without touching state.
    /// On success the updated position is best-effort persisted; a
    /// persistence failure is logged and the in-memory state remains
    /// authoritative.
    pub async fn apply_fill(
        &self,
        symbol: &str,
        signed_quantity: f64,
        price: f64,
        timestamp: f64,
    ) -> Result<Position, InvalidFillError> {
        if !signed_quantity.is_finite() || !price.is_finite() {
            let err = InvalidFillError {
                symbol: symbol.to_string(),
                quantity: signed_quantity,
                price,
            };
            error!("[{}] {} - fill dropped", symbol, err);
            return Err(err);
        }

        let updated = {
            let mut positions = self.positions.write().unwrap_or_else(|e| e.into_inner());
            let position = positions
                .entry(symbol.to_string())
                .or_insert_with(|| Position::new(symbol));
            let realized = position.apply_fill(signed_quantity, price, timestamp);
            if position.is_flat() {
                info!("[{}] Position closed, realized {:.8}", symbol, realized);
            } else {
                info!(
                    "[{}] Position updated: size={:.8}, entry={:.8}, realized_delta={:.8}",
                    symbol, position.size, position.entry_price, realized
                );
            }
            position.clone()
        };

        self.persist(&updated).await;
        Ok(updated)
    }

    async fn persist(&self, position: &Position) {
        let Some(store) = &self.store else {
            return;
        };

        let key = format!("{}{}", self.key_prefix, position.symbol);
        let value = match serde_json::to_string(position) {
            Ok(value) => value,
            Err(e) => {
                warn!("[{}] Could not serialize position: {}", position.symbol, e);
                return;
            }
        };

        if let Err(e) = store.put(&key, &value).await {
            warn!("[{}] Position persistence failed: {}", position.symbol, e);
        } else {
            debug!("[{}] Position persisted under {}", position.symbol, key);
        }
    }

    /// Snapshot of the position for a symbol, if one has ever been filled
    pub fn position(&self, symbol: &str) -> Option<Position> {
        self.positions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(symbol)
            .cloned()
    }

    /// Current signed size for a symbol (zero when unknown)
    pub fn size(&self, symbol: &str) -> f64 {
        self.position(symbol).map(|p| p.size).unwrap_or(0.0)
    }

    /// Does this symbol hold a non-flat position?
    pub fn has_open_position(&self, symbol: &str) -> bool {
        self.size(symbol).abs() > FLAT_EPSILON
    }

    /// Number of symbols with a non-flat position
    pub fn open_position_count(&self) -> usize {
        self.positions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|p| !p.is_flat())
            .count()
    }

    /// Unrealized PnL for a symbol at a mark, None when flat or unknown
    pub fn unrealized_pnl(&self, symbol: &str, mark_price: f64) -> Option<f64> {
        self.position(symbol)
            .and_then(|p| p.unrealized_at(mark_price))
    }

    /// Mark-to-market value of all open positions.
    ///
    /// Symbols with a missing or invalid mark are skipped with a warning,
    /// not an error.
    pub fn portfolio_value(&self, mark_prices: &HashMap<String, f64>) -> f64 {
        let positions = self.positions.read().unwrap_or_else(|e| e.into_inner());
        let mut total = 0.0;
        for (symbol, position) in positions.iter() {
            if position.is_flat() {
                continue;
            }
            match mark_prices.get(symbol) {
                Some(mark) if mark.is_finite() => total += position.notional_value(*mark),
                _ => warn!("[{}] No valid mark price, excluded from portfolio value", symbol),
            }
        }
        total
    }

    /// Combined value + open-position count under a single lock acquisition
    pub fn snapshot(&self, mark_prices: &HashMap<String, f64>) -> PortfolioSnapshot {
        let positions = self.positions.read().unwrap_or_else(|e| e.into_inner());
        let mut value = 0.0;
        let mut open = 0usize;
        for (symbol, position) in positions.iter() {
            if position.is_flat() {
                continue;
            }
            open += 1;
            match mark_prices.get(symbol) {
                Some(mark) if mark.is_finite() => value += position.notional_value(*mark),
                _ => warn!("[{}] No valid mark price, excluded from portfolio value", symbol),
            }
        }
        PortfolioSnapshot {
            value,
            open_positions: open,
        }
    }

    /// Clones of all tracked positions (flat included)
    pub fn all_positions(&self) -> Vec<Position> {
        self.positions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStateStore;

    #[tokio::test]
    async fn test_apply_fill_creates_position_lazily() {
        let store = PositionStore::new("helm");
        assert!(store.position("BTC/USDT").is_none());

        let position = store.apply_fill("BTC/USDT", 0.1, 100.0, 1.0).await.unwrap();
        assert_eq!(position.size, 0.1);
        assert_eq!(position.entry_price, 100.0);
        assert!(store.has_open_position("BTC/USDT"));
    }

    #[tokio::test]
    async fn test_invalid_fill_is_dropped() {
        let store = PositionStore::new("helm");
        store.apply_fill("BTC/USDT", 0.1, 100.0, 1.0).await.unwrap();

        let err = store
            .apply_fill("BTC/USDT", f64::NAN, 100.0, 2.0)
            .await
            .unwrap_err();
        assert_eq!(err.symbol, "BTC/USDT");

        // State unchanged
        let position = store.position("BTC/USDT").unwrap();
        assert_eq!(position.size, 0.1);
        assert_eq!(position.last_update_time, 1.0);
    }

    #[tokio::test]
    async fn test_flat_position_survives_for_audit() {
        let store = PositionStore::new("helm");
        store.apply_fill("BTC/USDT", 0.1, 100.0, 1.0).await.unwrap();
        store.apply_fill("BTC/USDT", -0.1, 110.0, 2.0).await.unwrap();

        let position = store.position("BTC/USDT").unwrap();
        assert!(position.is_flat());
        assert!((position.realized_pnl - 1.0).abs() < 1e-9);
        assert_eq!(store.open_position_count(), 0);
    }

    #[tokio::test]
    async fn test_portfolio_value_skips_missing_marks() {
        let store = PositionStore::new("helm");
        store.apply_fill("BTC/USDT", 0.1, 100.0, 1.0).await.unwrap();
        store.apply_fill("ETH/USDT", 2.0, 50.0, 1.0).await.unwrap();

        let mut marks = HashMap::new();
        marks.insert("BTC/USDT".to_string(), 110.0);
        // ETH mark missing: skipped, not an error
        assert!((store.portfolio_value(&marks) - 11.0).abs() < 1e-9);

        marks.insert("ETH/USDT".to_string(), f64::NAN);
        assert!((store.portfolio_value(&marks) - 11.0).abs() < 1e-9);

        marks.insert("ETH/USDT".to_string(), 60.0);
        assert!((store.portfolio_value(&marks) - 131.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_snapshot_counts_open_positions() {
        let store = PositionStore::new("helm");
        store.apply_fill("BTC/USDT", 0.1, 100.0, 1.0).await.unwrap();
        store.apply_fill("ETH/USDT", -1.0, 50.0, 1.0).await.unwrap();
        store.apply_fill("ETH/USDT", 1.0, 40.0, 2.0).await.unwrap(); // closes short

        let mut marks = HashMap::new();
        marks.insert("BTC/USDT".to_string(), 100.0);
        let snapshot = store.snapshot(&marks);
        assert_eq!(snapshot.open_positions, 1);
        assert!((snapshot.value - 10.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_persistence_round_trip() {
        let backing = Arc::new(MemoryStateStore::new());
        {
            let store = PositionStore::with_persistence("helm", backing.clone());
            store.apply_fill("BTC/USDT", 0.5, 200.0, 1.0).await.unwrap();
            store.apply_fill("ETH/USDT", -2.0, 30.0, 1.0).await.unwrap();
        }

        let restored = PositionStore::with_persistence("helm", backing.clone());
        restored.load().await;

        let btc = restored.position("BTC/USDT").unwrap();
        assert_eq!(btc.size, 0.5);
        assert_eq!(btc.entry_price, 200.0);
        assert_eq!(restored.size("ETH/USDT"), -2.0);
    }

    #[tokio::test]
    async fn test_corrupt_persisted_entry_is_skipped() {
        let backing = Arc::new(MemoryStateStore::new());
        backing
            .put("helm:position:BAD", "not-json")
            .await
            .unwrap();

        let store = PositionStore::with_persistence("helm", backing.clone());
        store.apply_fill("BTC/USDT", 1.0, 10.0, 1.0).await.unwrap();

        let restored = PositionStore::with_persistence("helm", backing);
        restored.load().await;
        assert!(restored.position("BAD").is_none());
        assert!(restored.position("BTC/USDT").is_some());
    }
}
