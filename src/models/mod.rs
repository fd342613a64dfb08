//! Data models for quotes, trade requests, orders, deals and accounts.

mod account;
mod deal;
mod order;
mod quote;
mod trade;

pub use account::{AccountInfo, AccountMargins};
pub use deal::{Deal, DealEntry, TradeResult};
pub use order::{
    retcode, Fill, FillMode, HistoricalOrder, OrderOutcome, OrderResponse, OrderSpec, OrderState,
    RejectReason, Rejection, TimeInForce,
};
pub use quote::Quote;
pub use trade::{TradeRequest, TradeSide, DEFAULT_MAGIC, DEFAULT_MAX_SLIPPAGE_PIPS};

#[cfg(test)]
pub(crate) use deal::sample_deal;
