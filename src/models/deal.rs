//! Deal records from the terminal history and the realized trade result
//! derived from them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::TradeSide;

/// Whether a deal opened, closed or reversed a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DealEntry {
    In,
    Out,
    InOut,
    OutBy,
}

impl DealEntry {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(DealEntry::In),
            1 => Some(DealEntry::Out),
            2 => Some(DealEntry::InOut),
            3 => Some(DealEntry::OutBy),
            _ => None,
        }
    }

    /// True for deals that realize profit on an existing position.
    pub fn is_exit(&self) -> bool {
        !matches!(self, DealEntry::In)
    }
}

/// Executed fill against a position. Read-only: the terminal owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    /// Deal ticket
    pub ticket: u64,

    /// Order ticket that produced the deal
    pub order: u64,

    /// Position the deal belongs to (the opening order's ticket)
    pub position_id: u64,

    /// Execution time
    pub time: DateTime<Utc>,

    pub symbol: String,

    /// Buy/sell direction, absent for balance and other non-trade deals
    pub side: Option<TradeSide>,

    pub entry: DealEntry,

    pub volume: Decimal,

    pub price: Decimal,

    /// Gross profit booked by this deal
    pub profit: Decimal,

    #[serde(default)]
    pub commission: Decimal,

    #[serde(default)]
    pub swap: Decimal,

    #[serde(default)]
    pub fee: Decimal,

    #[serde(default)]
    pub magic: u64,

    #[serde(default)]
    pub comment: String,
}

impl Deal {
    /// Profit after commission, swap and fee.
    pub fn net_profit(&self) -> Decimal {
        self.profit + self.commission + self.swap + self.fee
    }
}

/// Realized result of a position, available once it has an opening and a
/// closing deal.
///
/// Only the last deal is reported. Profit booked by earlier partial closes is
/// not included in `net_profit`; check [`TradeResult::is_partial`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeResult {
    pub order_ticket: u64,
    pub closing_deal: Deal,
    pub net_profit: Decimal,
    /// Number of deals linked to the position when it was resolved
    pub deal_count: usize,
}

impl TradeResult {
    pub fn new(order_ticket: u64, closing_deal: Deal, deal_count: usize) -> Self {
        let net_profit = closing_deal.net_profit();
        Self {
            order_ticket,
            closing_deal,
            net_profit,
            deal_count,
        }
    }

    /// The position was closed in more than one step.
    pub fn is_partial(&self) -> bool {
        self.deal_count > 2
    }

    pub fn is_win(&self) -> bool {
        self.net_profit > Decimal::ZERO
    }
}

#[cfg(test)]
pub(crate) fn sample_deal(ticket: u64, position_id: u64, entry: DealEntry, profit: Decimal) -> Deal {
    use chrono::TimeZone;

    Deal {
        ticket,
        order: ticket,
        position_id,
        time: Utc
            .timestamp_opt(1_700_000_000 + ticket as i64 * 60, 0)
            .single()
            .unwrap(),
        symbol: "EURUSD".to_string(),
        side: Some(TradeSide::Buy),
        entry,
        volume: Decimal::new(1, 1),
        price: Decimal::new(11000, 4),
        profit,
        commission: Decimal::ZERO,
        swap: Decimal::ZERO,
        fee: Decimal::ZERO,
        magic: 1000,
        comment: String::new(),
    }
}
