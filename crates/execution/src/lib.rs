//! Helm Execution
//!
//! The execution layer sits between approved signals and the exchange.
//! `OrderFormatter` snaps quantities and prices to exchange precision
//! rules and enforces minimum order sizes; `StaticMetadata` is the
//! in-process `MarketMetadata` source; `SimulatedSubmitter` is an
//! `OrderSubmitter` that fills orders against a mark-price board instead
//! of a live venue.

mod error;
mod formatter;
mod metadata;
mod simulator;

pub use error::FormattingError;
pub use formatter::OrderFormatter;
pub use metadata::StaticMetadata;
pub use simulator::SimulatedSubmitter;
