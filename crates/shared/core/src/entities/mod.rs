mod market_data;
mod portfolio;
mod position;
mod signal;

pub use market_data::{MarketDataUpdate, ModelPrediction};
pub use portfolio::PortfolioSnapshot;
pub use position::{FLAT_EPSILON, Position};
pub use signal::{OrderType, Signal, SignalAction};
