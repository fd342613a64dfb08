//! Trade request model: what a caller asks the gateway to open.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default magic number stamped on orders opened through the gateway.
pub const DEFAULT_MAGIC: u64 = 1000;

/// Default tolerated drift between requested entry and live price, in pips.
pub const DEFAULT_MAX_SLIPPAGE_PIPS: u32 = 10;

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Ok(TradeSide::Buy),
            "SELL" => Ok(TradeSide::Sell),
            other => Err(format!("unknown trade side '{}', expected BUY or SELL", other)),
        }
    }
}

/// A market-execution request, built by the caller and validated by the gateway
/// before anything is sent to the terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRequest {
    /// Symbol without the broker suffix (e.g. "EURUSD")
    pub symbol: String,

    /// Trade direction
    pub side: TradeSide,

    /// Lot size, must be positive
    pub volume: Decimal,

    /// Price the caller expects to enter at
    pub entry_price: Decimal,

    /// Stop loss price
    pub stop_loss: Decimal,

    /// Take profit price
    pub take_profit: Decimal,

    /// Expert/magic identifier stamped on the order
    #[serde(default = "default_magic")]
    pub magic: u64,

    /// Free-form order comment
    #[serde(default)]
    pub note: String,

    /// Maximum drift between entry and live price before the request is stale
    #[serde(default = "default_max_slippage")]
    pub max_slippage_pips: u32,
}

fn default_magic() -> u64 {
    DEFAULT_MAGIC
}

fn default_max_slippage() -> u32 {
    DEFAULT_MAX_SLIPPAGE_PIPS
}

impl TradeRequest {
    /// Create a request with the default magic number, empty note and
    /// a 10 pip slippage allowance.
    pub fn new(
        symbol: impl Into<String>,
        side: TradeSide,
        volume: Decimal,
        entry_price: Decimal,
        stop_loss: Decimal,
        take_profit: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            volume,
            entry_price,
            stop_loss,
            take_profit,
            magic: DEFAULT_MAGIC,
            note: String::new(),
            max_slippage_pips: DEFAULT_MAX_SLIPPAGE_PIPS,
        }
    }

    pub fn with_magic(mut self, magic: u64) -> Self {
        self.magic = magic;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn with_max_slippage_pips(mut self, pips: u32) -> Self {
        self.max_slippage_pips = pips;
        self
    }

    /// Check the fields that can be judged without the terminal.
    pub fn validate(&self) -> Result<(), String> {
        if self.symbol.trim().is_empty() {
            return Err("symbol must not be empty".to_string());
        }
        if self.volume <= Decimal::ZERO {
            return Err(format!("volume must be positive, got {}", self.volume));
        }
        if self.entry_price <= Decimal::ZERO {
            return Err(format!("entry price must be positive, got {}", self.entry_price));
        }
        Ok(())
    }
}
