//! Trading account snapshot.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub login: u64,
    pub server: String,
    pub currency: String,
    pub leverage: u32,
    pub balance: Decimal,
    pub equity: Decimal,
    /// Floating profit of open positions
    pub profit: Decimal,
    /// Margin in use
    pub margin: Decimal,
    pub margin_free: Decimal,
    /// Equity to margin ratio in percent, zero when no margin is used
    pub margin_level: Decimal,
}

/// Margin levels of an account.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccountMargins {
    pub used: Decimal,
    pub free: Decimal,
    pub level: Decimal,
}

impl AccountInfo {
    pub fn margins(&self) -> AccountMargins {
        AccountMargins {
            used: self.margin,
            free: self.margin_free,
            level: self.margin_level,
        }
    }
}
