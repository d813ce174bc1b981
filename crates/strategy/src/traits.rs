use helm_core::{MarketDataUpdate, ModelPrediction, Signal};
use std::collections::HashMap;

/// Loose parameter bag for runtime strategy tuning
pub type StrategyParams = HashMap<String, f64>;

/// A signal-generating trading strategy.
///
/// Implementations are synchronous and single-symbol: each instance is
/// owned by exactly one symbol slot in the registry and is never called
/// concurrently. State accumulated in `on_market_update` (price windows,
/// rolling statistics) feeds `generate_signal`.
pub trait Strategy: Send + std::fmt::Debug {
    /// Stable strategy kind name, used by the regime mapping
    fn name(&self) -> &'static str;

    /// Ingest a market data update into internal state
    fn on_market_update(&mut self, data: &MarketDataUpdate);

    /// Produce a signal for the current state. Must return a Hold signal
    /// rather than panic when there is not enough data.
    fn generate_signal(
        &mut self,
        symbol: &str,
        data: &MarketDataUpdate,
        prediction: Option<&ModelPrediction>,
    ) -> Signal;

    /// Apply updated parameters at runtime. Unknown keys are ignored.
    fn update_parameters(&mut self, _params: &StrategyParams) {}
}
