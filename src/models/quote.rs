//! Live quote for a symbol.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::TradeSide;

/// Bid/ask snapshot taken at query time. Never cached by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Full terminal symbol (including any broker suffix)
    pub symbol: String,

    /// Price the market buys at (we sell at bid)
    pub bid: Decimal,

    /// Price the market sells at (we buy at ask)
    pub ask: Decimal,

    /// Quoting precision of the instrument, when the terminal reports it
    #[serde(default)]
    pub digits: Option<u32>,
}

impl Quote {
    /// Price a market order on `side` would execute at.
    pub fn execution_price(&self, side: TradeSide) -> Decimal {
        match side {
            TradeSide::Buy => self.ask,
            TradeSide::Sell => self.bid,
        }
    }

    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }
}
