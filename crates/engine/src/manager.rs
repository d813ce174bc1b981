use crate::config::EngineConfig;
use crate::error::EngineError;
use dashmap::DashMap;
use helm_core::MarketDataUpdate;
use helm_execution::OrderFormatter;
use helm_portfolio::PositionStore;
use helm_ports::OrderSubmitter;
use helm_risk::{PortfolioView, RiskGate};
use helm_strategy::StrategyRegistry;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How a trade cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Order submitted; any fill was applied to the position store
    Completed,
    /// Strategy produced a Hold signal
    Held,
    /// Risk gate refused the signal
    RiskRejected,
    /// Cycle aborted at the named stage; symbol retries on the next update
    Aborted(&'static str),
}

/// One symbol's in-flight (or most recent) trade cycle.
///
/// The slot is only replaced once its task has finished; waiting for the
/// outcome goes through the watch channel and never vacates the slot, so
/// the one-cycle-per-symbol check cannot be defeated by a waiter.
struct CycleSlot {
    handle: JoinHandle<()>,
    outcome: watch::Receiver<Option<CycleOutcome>>,
}

/// Orchestrates the trading loop.
///
/// One cycle per symbol at a time: a market update for a symbol with a
/// cycle already in flight only refreshes the data boards and is never
/// queued. Cycles for different symbols share no locks beyond the
/// position store's map and run fully concurrently.
pub struct TradingManager {
    config: EngineConfig,
    registry: Arc<StrategyRegistry>,
    positions: Arc<PositionStore>,
    risk: Arc<RiskGate>,
    formatter: Arc<OrderFormatter>,
    submitter: Arc<dyn OrderSubmitter>,
    running: AtomicBool,
    cycles: Mutex<HashMap<String, CycleSlot>>,
    latest_data: DashMap<String, MarketDataUpdate>,
    latest_marks: DashMap<String, f64>,
}

impl TradingManager {
    pub fn new(
        config: EngineConfig,
        registry: Arc<StrategyRegistry>,
        positions: Arc<PositionStore>,
        risk: Arc<RiskGate>,
        formatter: Arc<OrderFormatter>,
        submitter: Arc<dyn OrderSubmitter>,
    ) -> Self {
        info!("TradingManager managing symbols: {:?}", config.symbols);
        Self {
            config,
            registry,
            positions,
            risk,
            formatter,
            submitter,
            running: AtomicBool::new(false),
            cycles: Mutex::new(HashMap::new()),
            latest_data: DashMap::new(),
            latest_marks: DashMap::new(),
        }
    }

    /// Initialize the submitter and load persisted positions.
    ///
    /// A submitter initialization failure is fatal; nothing else here is.
    pub async fn start(&self) -> Result<(), EngineError> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("TradingManager already running");
            return Ok(());
        }
        info!("Starting TradingManager");

        if let Err(e) = self.submitter.initialize().await {
            self.running.store(false, Ordering::SeqCst);
            return Err(EngineError::SubmitterInit(e));
        }
        self.positions.load().await;

        info!("TradingManager started");
        Ok(())
    }

    /// Stop accepting updates, cancel in-flight cycles, then release the
    /// submitter. The submitter is closed last so a cycle can never see
    /// a closed boundary while the engine claims to be running.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("TradingManager not running");
            return;
        }
        info!("Stopping TradingManager");

        let slots: Vec<(String, CycleSlot)> = {
            let mut cycles = self.cycles.lock().unwrap_or_else(|e| e.into_inner());
            cycles.drain().collect()
        };
        for (symbol, slot) in slots {
            if !slot.handle.is_finished() {
                debug!("[{symbol}] Aborting in-flight trade cycle");
                slot.handle.abort();
            }
            let _ = slot.handle.await;
        }

        self.submitter.close().await;
        info!("TradingManager stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ingest a market data update for a symbol.
    ///
    /// Always refreshes the data and mark boards; spawns a trade cycle
    /// only when the engine is running and no cycle for this symbol is
    /// in flight. Returns whether a cycle was spawned.
    pub fn on_market_update(self: &Arc<Self>, symbol: &str, data: MarketDataUpdate) -> bool {
        if let Some(mark) = data.mid_price() {
            self.latest_marks.insert(symbol.to_string(), mark);
        }
        self.latest_data.insert(symbol.to_string(), data.clone());

        if !self.is_running() {
            debug!("[{symbol}] Engine not running, update recorded only");
            return false;
        }

        let mut cycles = self.cycles.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = cycles.get(symbol) {
            if !slot.handle.is_finished() {
                debug!("[{symbol}] Trade cycle busy, skipping update");
                return false;
            }
        }

        let (tx, rx) = watch::channel(None);
        let manager = Arc::clone(self);
        let symbol_owned = symbol.to_string();
        let handle = tokio::spawn(async move {
            let outcome = manager.run_cycle(symbol_owned, data).await;
            let _ = tx.send(Some(outcome));
        });
        cycles.insert(symbol.to_string(), CycleSlot { handle, outcome: rx });
        true
    }

    /// Wait for the in-flight cycle for a symbol, if any, and return its
    /// outcome (or the outcome of the most recent one when idle).
    ///
    /// The slot stays occupied while waiting: a concurrent update for the
    /// same symbol still sees the busy cycle and is dropped. Returns None
    /// when the symbol never ran a cycle or the cycle was aborted by
    /// `stop()`.
    pub async fn join_cycle(&self, symbol: &str) -> Option<CycleOutcome> {
        let rx = {
            let cycles = self.cycles.lock().unwrap_or_else(|e| e.into_inner());
            cycles.get(symbol).map(|slot| slot.outcome.clone())
        };
        let mut rx = rx?;
        match rx.wait_for(|outcome| outcome.is_some()).await {
            Ok(outcome) => *outcome,
            // Sender dropped without a value: the cycle was aborted
            Err(_) => None,
        }
    }

    /// Most recent market data recorded for a symbol, whether or not a
    /// cycle consumed it.
    pub fn latest_data(&self, symbol: &str) -> Option<MarketDataUpdate> {
        self.latest_data.get(symbol).map(|entry| entry.clone())
    }

    pub fn positions(&self) -> &Arc<PositionStore> {
        &self.positions
    }

    pub fn risk(&self) -> &Arc<RiskGate> {
        &self.risk
    }

    fn marks(&self) -> HashMap<String, f64> {
        self.latest_marks
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    /// One full trade cycle: strategy, risk gate, formatter, submitter,
    /// position update. Every early return maps to a `CycleOutcome`.
    async fn run_cycle(&self, symbol: String, data: MarketDataUpdate) -> CycleOutcome {
        debug!("[{symbol}] Trade cycle started");

        // Updates arriving while the previous cycle ran only refreshed the
        // board; trade on the freshest one rather than the spawning update.
        let data = self.latest_data(&symbol).unwrap_or(data);

        let slot = match self.registry.strategy_for(&symbol, &self.config.regime) {
            Ok(slot) => slot,
            Err(e) => {
                error!("[{symbol}] No strategy available: {e}");
                return CycleOutcome::Aborted("strategy");
            }
        };
        let signal = {
            let mut strategy = slot.lock().await;
            strategy.on_market_update(&data);
            strategy.generate_signal(&symbol, &data, None)
        };
        if signal.is_hold() {
            debug!("[{symbol}] Strategy holds");
            return CycleOutcome::Held;
        }
        info!(
            "[{symbol}] Signal: {:?} {:.8} @ {:.8}",
            signal.action, signal.quantity, signal.price
        );

        let marks = self.marks();
        let snapshot = self.positions.snapshot(&marks);
        self.risk.observe_portfolio_value(snapshot.value);
        let view = PortfolioView {
            value: snapshot.value,
            open_positions: snapshot.open_positions,
            symbol_has_position: self.positions.has_open_position(&symbol),
            current_size: self.positions.size(&symbol),
        };
        let signal = match self.risk.validate(signal, view) {
            Ok(signal) => signal,
            Err(rejection) => {
                info!("{rejection}");
                return CycleOutcome::RiskRejected;
            }
        };

        let formatted = match self.formatter.format_signal(&signal) {
            Ok(formatted) if formatted.is_executable() => formatted,
            Ok(formatted) => {
                warn!(
                    "[{symbol}] Formatted signal not executable: qty={:.8}, price={:.8}",
                    formatted.quantity, formatted.price
                );
                return CycleOutcome::Aborted("format");
            }
            Err(e) => {
                error!("[{symbol}] {e}");
                return CycleOutcome::Aborted("format");
            }
        };

        let report = match self.submitter.submit(&formatted).await {
            Ok(report) => report,
            Err(e) => {
                error!("[{symbol}] Order submission failed: {e}");
                return CycleOutcome::Aborted("submit");
            }
        };
        info!(
            "[{symbol}] Order {}: {:?}",
            report.order_id, report.status
        );

        if let Some(fill) = report.fill() {
            let signed = formatted.signed_quantity(fill.quantity);
            match self
                .positions
                .apply_fill(&symbol, signed, fill.price, fill.timestamp)
                .await
            {
                Ok(position) => {
                    info!(
                        "[{symbol}] Fill applied: size={:.8}, entry={:.8}",
                        position.size, position.entry_price
                    );
                }
                Err(e) => {
                    error!("[{symbol}] {e}");
                    return CycleOutcome::Aborted("apply_fill");
                }
            }
        }

        debug!("[{symbol}] Trade cycle finished");
        CycleOutcome::Completed
    }
}
