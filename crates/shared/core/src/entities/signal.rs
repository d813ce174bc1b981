use serde::{Deserialize, Serialize};

/// What the strategy wants to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SignalAction {
    Buy,
    Sell,
    /// No trade this cycle
    #[default]
    Hold,
}

impl SignalAction {
    /// Sign applied to fill quantities (Buy adds, Sell removes)
    pub fn sign(&self) -> f64 {
        match self {
            SignalAction::Buy => 1.0,
            SignalAction::Sell => -1.0,
            SignalAction::Hold => 0.0,
        }
    }
}

/// Order types supported by the execution boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderType {
    /// Execute at specified price or better
    #[default]
    Limit,
    /// Execute at current market price
    Market,
}

/// Signal from a strategy
///
/// Immutable per generation: the risk gate may return a resized copy, but
/// a signal is never mutated in place once emitted. A Hold signal carries
/// no execution-relevant fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Instrument to trade
    pub symbol: String,
    /// Buy, Sell, or Hold
    pub action: SignalAction,
    /// Intended order price (ignored for Hold)
    pub price: f64,
    /// Intended order quantity in base units (ignored for Hold)
    pub quantity: f64,
    /// Limit or Market
    pub order_type: OrderType,
    /// Optional protective stop price
    pub stop_loss: Option<f64>,
    /// Optional profit target price
    pub take_profit: Option<f64>,
    /// Strategy conviction in [0, 1]
    pub confidence: f64,
}

impl Signal {
    /// Create a Hold signal for a symbol
    pub fn hold(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            action: SignalAction::Hold,
            price: 0.0,
            quantity: 0.0,
            order_type: OrderType::default(),
            stop_loss: None,
            take_profit: None,
            confidence: 0.0,
        }
    }

    /// Create a Buy signal
    pub fn buy(symbol: impl Into<String>, price: f64, quantity: f64) -> Self {
        Self {
            symbol: symbol.into(),
            action: SignalAction::Buy,
            price,
            quantity,
            order_type: OrderType::default(),
            stop_loss: None,
            take_profit: None,
            confidence: 1.0,
        }
    }

    /// Create a Sell signal
    pub fn sell(symbol: impl Into<String>, price: f64, quantity: f64) -> Self {
        Self {
            symbol: symbol.into(),
            action: SignalAction::Sell,
            price,
            quantity,
            order_type: OrderType::default(),
            stop_loss: None,
            take_profit: None,
            confidence: 1.0,
        }
    }

    /// Builder: set the order type
    pub fn with_order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = order_type;
        self
    }

    /// Builder: set the stop loss price
    pub fn with_stop_loss(mut self, price: f64) -> Self {
        self.stop_loss = Some(price);
        self
    }

    /// Builder: set the take profit price
    pub fn with_take_profit(mut self, price: f64) -> Self {
        self.take_profit = Some(price);
        self
    }

    /// Builder: set confidence (clamped to [0, 1])
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Builder: return a copy with a different quantity
    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = quantity;
        self
    }

    /// Is this a Hold signal?
    pub fn is_hold(&self) -> bool {
        self.action == SignalAction::Hold
    }

    /// Does this signal carry executable order parameters?
    ///
    /// Invariant: quantity > 0 and price > 0 whenever action != Hold.
    pub fn is_executable(&self) -> bool {
        !self.is_hold()
            && self.quantity > 0.0
            && self.quantity.is_finite()
            && self.price > 0.0
            && self.price.is_finite()
    }

    /// Signed fill quantity for a given executed amount
    pub fn signed_quantity(&self, filled: f64) -> f64 {
        self.action.sign() * filled
    }
}
