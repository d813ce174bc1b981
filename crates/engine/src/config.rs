use serde::{Deserialize, Serialize};

/// Engine runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Symbols the engine trades
    pub symbols: Vec<String>,
    /// Market regime fed into strategy selection
    pub regime: String,
    /// Namespace for persisted state keys
    pub namespace: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["BTC/USDT".to_string()],
            regime: "default".to_string(),
            namespace: "helm".to_string(),
        }
    }
}
