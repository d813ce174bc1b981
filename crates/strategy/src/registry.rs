use crate::error::RegistryError;
use crate::traits::{Strategy, StrategyParams};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

/// One symbol's strategy instance behind its own async lock.
///
/// Trade cycles for different symbols never contend; the lock only
/// serializes a cycle against a parameter update for the same symbol.
pub type StrategySlot = Arc<Mutex<Box<dyn Strategy + Send>>>;

type StrategyFactory = Arc<dyn Fn() -> Box<dyn Strategy + Send> + Send + Sync>;

struct ActiveStrategy {
    kind: String,
    slot: StrategySlot,
}

/// Owns strategy construction and the per-symbol active instances.
///
/// Strategy kinds register under a name; market regimes map to kinds,
/// with a "default" mapping as the fallback. `strategy_for` hands back
/// the existing instance while the regime keeps mapping to the same
/// kind and replaces it (discarding accumulated state) when the regime
/// changes.
pub struct StrategyRegistry {
    factories: HashMap<String, StrategyFactory>,
    regime_map: HashMap<String, String>,
    active: StdMutex<HashMap<String, ActiveStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            regime_map: HashMap::new(),
            active: StdMutex::new(HashMap::new()),
        }
    }

    /// Register a strategy kind under a name
    pub fn with_strategy<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Strategy + Send> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    /// Map a market regime to a registered strategy kind
    pub fn with_regime(mut self, regime: impl Into<String>, kind: impl Into<String>) -> Self {
        self.regime_map.insert(regime.into(), kind.into());
        self
    }

    pub fn registered_kinds(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    fn kind_for_regime(&self, regime: &str) -> Result<&str, RegistryError> {
        self.regime_map
            .get(regime)
            .or_else(|| self.regime_map.get("default"))
            .map(String::as_str)
            .ok_or_else(|| RegistryError::UnmappedRegime(regime.to_string()))
    }

    /// Get (or create) the active strategy slot for a symbol under the
    /// given market regime.
    pub fn strategy_for(&self, symbol: &str, regime: &str) -> Result<StrategySlot, RegistryError> {
        let kind = self.kind_for_regime(regime)?;
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| RegistryError::UnknownStrategy(kind.to_string()))?;

        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = active.get(symbol) {
            if existing.kind == kind {
                debug!("[{symbol}] Using existing '{kind}' instance");
                return Ok(Arc::clone(&existing.slot));
            }
            info!(
                "[{symbol}] Regime changed, replacing '{}' with '{kind}'",
                existing.kind
            );
        } else {
            info!("[{symbol}] Creating new '{kind}' instance");
        }

        let slot: StrategySlot = Arc::new(Mutex::new(factory()));
        active.insert(
            symbol.to_string(),
            ActiveStrategy {
                kind: kind.to_string(),
                slot: Arc::clone(&slot),
            },
        );
        Ok(slot)
    }

    /// Apply parameters to the active strategy for a symbol, if any
    pub async fn update_parameters(&self, symbol: &str, params: &StrategyParams) {
        let slot = {
            let active = self.active.lock().unwrap_or_else(|e| e.into_inner());
            active.get(symbol).map(|entry| Arc::clone(&entry.slot))
        };
        match slot {
            Some(slot) => slot.lock().await.update_parameters(params),
            None => warn!("[{symbol}] Cannot update parameters, no active strategy"),
        }
    }

    /// Number of symbols with an active strategy instance
    pub fn active_count(&self) -> usize {
        self.active.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
