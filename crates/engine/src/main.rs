use helm_engine::{EngineConfig, SimulatedFeed, TradingManager};
use helm_execution::{OrderFormatter, SimulatedSubmitter, StaticMetadata};
use helm_portfolio::{MemoryStateStore, PositionStore};
use helm_ports::{PrecisionRule, SymbolLimits, SymbolPrecision};
use helm_risk::{RiskConfig, RiskGate};
use helm_strategy::{
    MeanReversionConfig, MeanReversionStrategy, MomentumConfig, MomentumStrategy,
    StrategyRegistry,
};
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = EngineConfig {
        symbols: vec!["BTC/USDT".to_string(), "ETH/USDT".to_string()],
        regime: "default".to_string(),
        namespace: "helm".to_string(),
    };

    let registry = Arc::new(
        StrategyRegistry::new()
            .with_strategy("momentum", || {
                Box::new(MomentumStrategy::new(MomentumConfig::default()))
            })
            .with_strategy("mean_reversion", || {
                Box::new(MeanReversionStrategy::new(MeanReversionConfig::default()))
            })
            .with_regime("trending", "momentum")
            .with_regime("ranging", "mean_reversion")
            .with_regime("default", "momentum"),
    );

    let positions = Arc::new(PositionStore::with_persistence(
        &config.namespace,
        Arc::new(MemoryStateStore::new()),
    ));
    let risk = Arc::new(RiskGate::new(RiskConfig::default()));

    let metadata = StaticMetadata::new()
        .with_precision(
            "BTC/USDT",
            SymbolPrecision {
                amount: Some(PrecisionRule::DecimalPlaces(5)),
                price: Some(PrecisionRule::DecimalPlaces(1)),
            },
        )
        .with_limits(
            "BTC/USDT",
            SymbolLimits {
                min_amount: Some(0.00001),
                min_cost: Some(5.0),
            },
        )
        .with_precision(
            "ETH/USDT",
            SymbolPrecision {
                amount: Some(PrecisionRule::StepSize(0.0001)),
                price: Some(PrecisionRule::StepSize(0.01)),
            },
        );
    let formatter = Arc::new(OrderFormatter::new(Arc::new(metadata)));

    let submitter = Arc::new(SimulatedSubmitter::new().with_fill_latency(50));
    let fill_marks = submitter.marks();

    let manager = Arc::new(TradingManager::new(
        config.clone(),
        registry,
        positions,
        risk,
        formatter,
        submitter,
    ));

    if let Err(e) = manager.start().await {
        error!("Engine failed to start: {e}");
        std::process::exit(1);
    }

    let feed = SimulatedFeed::new(config.symbols.clone(), Duration::from_millis(500))
        .with_mark_sink(fill_marks)
        .spawn(Arc::clone(&manager));

    info!("Engine running, Ctrl-C to stop");
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }

    manager.stop().await;
    let _ = feed.await;

    for position in manager.positions().all_positions() {
        info!(
            "[{}] Final position: size={:.8}, entry={:.8}, realized={:.8}",
            position.symbol, position.size, position.entry_price, position.realized_pnl
        );
    }
}
