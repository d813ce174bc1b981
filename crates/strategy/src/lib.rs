//! Helm Strategy
//!
//! Signal-generating strategies and the registry that owns them. Each
//! symbol gets its own strategy instance, selected through a market-regime
//! mapping; a regime change swaps the instance (and its accumulated state)
//! for a fresh one of the mapped kind. Strategies are synchronous and
//! stateful; concurrency is the registry's problem, solved with one async
//! mutex per symbol slot.

mod error;
mod mean_reversion;
mod momentum;
mod registry;
mod traits;

pub use error::RegistryError;
pub use mean_reversion::{MeanReversionConfig, MeanReversionStrategy};
pub use momentum::{MomentumConfig, MomentumStrategy};
pub use registry::{StrategyRegistry, StrategySlot};
pub use traits::{Strategy, StrategyParams};
