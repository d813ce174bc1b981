//! Helm Portfolio
//!
//! Owns one `Position` per symbol and is the only component allowed to
//! mutate position state. Fills arrive through `apply_fill`, PnL and
//! portfolio value are computed from supplied mark prices, and every
//! successful fill is best-effort mirrored to an optional state store.

mod error;
mod memory;
mod store;

pub use error::InvalidFillError;
pub use memory::MemoryStateStore;
pub use store::PositionStore;
