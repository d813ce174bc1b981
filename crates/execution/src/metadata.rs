use dashmap::DashMap;
use helm_ports::{MarketMetadata, SymbolLimits, SymbolPrecision};

/// In-process market metadata source.
///
/// Populated up front from configuration (or by hand in tests); symbols
/// without entries simply have no precision or limit rules.
#[derive(Default)]
pub struct StaticMetadata {
    precision: DashMap<String, SymbolPrecision>,
    limits: DashMap<String, SymbolLimits>,
}

impl StaticMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_precision(self, symbol: impl Into<String>, precision: SymbolPrecision) -> Self {
        self.precision.insert(symbol.into(), precision);
        self
    }

    pub fn with_limits(self, symbol: impl Into<String>, limits: SymbolLimits) -> Self {
        self.limits.insert(symbol.into(), limits);
        self
    }
}

impl MarketMetadata for StaticMetadata {
    fn precision(&self, symbol: &str) -> Option<SymbolPrecision> {
        self.precision.get(symbol).map(|entry| *entry)
    }

    fn limits(&self, symbol: &str) -> Option<SymbolLimits> {
        self.limits.get(symbol).map(|entry| *entry)
    }
}
