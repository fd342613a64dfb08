//! Wire types of the terminal bridge API.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{
    AccountInfo, Deal, DealEntry, HistoricalOrder, OrderResponse, OrderSpec, OrderState, Quote,
    TradeSide,
};

use super::SessionError;

/// Terminal trade action for an immediate market execution.
const TRADE_ACTION_DEAL: u32 = 1;

/// Body of `POST /session/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub login: u64,
    pub password: &'a str,
    pub server: &'a str,
    /// Terminal-side login timeout in milliseconds
    pub timeout: u64,
}

/// Symbol snapshot from `GET /symbol`.
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolResponse {
    pub name: String,
    pub bid: Decimal,
    pub ask: Decimal,
    #[serde(default)]
    pub digits: Option<u32>,
}

impl From<SymbolResponse> for Quote {
    fn from(s: SymbolResponse) -> Self {
        Quote {
            symbol: s.name,
            bid: s.bid,
            ask: s.ask,
            digits: s.digits,
        }
    }
}

/// Body of `POST /orders`, field names follow the terminal's trade request.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSendRequest {
    pub action: u32,
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub volume: Decimal,
    #[serde(rename = "type")]
    pub order_type: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub sl: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tp: Decimal,
    pub magic: u64,
    pub comment: String,
    pub type_time: u32,
    pub type_filling: u32,
}

impl From<&OrderSpec> for OrderSendRequest {
    fn from(o: &OrderSpec) -> Self {
        Self {
            action: TRADE_ACTION_DEAL,
            symbol: o.symbol.clone(),
            volume: o.volume,
            order_type: match o.side {
                TradeSide::Buy => 0,
                TradeSide::Sell => 1,
            },
            price: o.price,
            sl: o.stop_loss,
            tp: o.take_profit,
            magic: o.magic,
            comment: o.comment.clone(),
            type_time: o.time_in_force.code(),
            type_filling: o.fill_mode.code(),
        }
    }
}

/// Reply of `POST /orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderSendResponse {
    pub retcode: u32,
    #[serde(default)]
    pub deal: u64,
    #[serde(default)]
    pub order: u64,
    #[serde(default)]
    pub volume: Decimal,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub bid: Decimal,
    #[serde(default)]
    pub ask: Decimal,
    #[serde(default)]
    pub comment: String,
}

impl From<OrderSendResponse> for OrderResponse {
    fn from(r: OrderSendResponse) -> Self {
        OrderResponse {
            retcode: r.retcode,
            deal: r.deal,
            order: r.order,
            volume: r.volume,
            price: r.price,
            bid: r.bid,
            ask: r.ask,
            comment: r.comment,
        }
    }
}

/// Deal record from `GET /history/deals`.
#[derive(Debug, Clone, Deserialize)]
pub struct DealResponse {
    pub ticket: u64,
    #[serde(default)]
    pub order: u64,
    pub position_id: u64,
    /// Execution time, unix seconds
    pub time: i64,
    #[serde(default)]
    pub symbol: String,
    #[serde(rename = "type")]
    pub deal_type: u32,
    pub entry: u32,
    pub volume: Decimal,
    pub price: Decimal,
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

impl TryFrom<DealResponse> for Deal {
    type Error = SessionError;

    fn try_from(d: DealResponse) -> Result<Self, Self::Error> {
        let entry = DealEntry::from_code(d.entry).ok_or_else(|| {
            SessionError::Decode(format!("deal {} has unknown entry code {}", d.ticket, d.entry))
        })?;

        Ok(Deal {
            ticket: d.ticket,
            order: d.order,
            position_id: d.position_id,
            time: timestamp(d.time)?,
            symbol: d.symbol,
            side: match d.deal_type {
                0 => Some(TradeSide::Buy),
                1 => Some(TradeSide::Sell),
                _ => None,
            },
            entry,
            volume: d.volume,
            price: d.price,
            profit: d.profit,
            commission: d.commission,
            swap: d.swap,
            fee: d.fee,
            magic: d.magic,
            comment: d.comment,
        })
    }
}

/// Order record from `GET /history/orders/{ticket}`.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryOrderResponse {
    pub ticket: u64,
    #[serde(default)]
    pub position_id: u64,
    #[serde(default)]
    pub symbol: String,
    #[serde(rename = "type")]
    pub order_type: u32,
    pub state: u32,
    pub time_setup: i64,
    #[serde(default)]
    pub time_done: i64,
    #[serde(default)]
    pub volume_initial: Decimal,
    #[serde(default)]
    pub volume_current: Decimal,
    #[serde(default)]
    pub price_open: Decimal,
    #[serde(default)]
    pub sl: Decimal,
    #[serde(default)]
    pub tp: Decimal,
    #[serde(default)]
    pub magic: u64,
    #[serde(default)]
    pub comment: String,
}

impl TryFrom<HistoryOrderResponse> for HistoricalOrder {
    type Error = SessionError;

    fn try_from(o: HistoryOrderResponse) -> Result<Self, Self::Error> {
        // Pending order types alternate buy/sell (buy limit = 2, sell limit = 3, ...)
        let side = match o.order_type {
            0..=7 if o.order_type % 2 == 0 => Some(TradeSide::Buy),
            0..=7 => Some(TradeSide::Sell),
            _ => None,
        };
        let time_done = if o.time_done > 0 {
            Some(timestamp(o.time_done)?)
        } else {
            None
        };

        Ok(HistoricalOrder {
            ticket: o.ticket,
            position_id: o.position_id,
            symbol: o.symbol,
            side,
            state: OrderState::from_code(o.state),
            time_setup: timestamp(o.time_setup)?,
            time_done,
            volume_initial: o.volume_initial,
            volume_current: o.volume_current,
            price_open: o.price_open,
            stop_loss: o.sl,
            take_profit: o.tp,
            magic: o.magic,
            comment: o.comment,
        })
    }
}

/// Account snapshot from `GET /account`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountResponse {
    pub login: u64,
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub currency: String,
    pub leverage: u32,
    pub balance: Decimal,
    pub equity: Decimal,
    #[serde(default)]
    pub profit: Decimal,
    #[serde(default)]
    pub margin: Decimal,
    #[serde(default)]
    pub margin_free: Decimal,
    #[serde(default)]
    pub margin_level: Decimal,
}

impl From<AccountResponse> for AccountInfo {
    fn from(a: AccountResponse) -> Self {
        AccountInfo {
            login: a.login,
            server: a.server,
            currency: a.currency,
            leverage: a.leverage,
            balance: a.balance,
            equity: a.equity,
            profit: a.profit,
            margin: a.margin,
            margin_free: a.margin_free,
            margin_level: a.margin_level,
        }
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, SessionError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| SessionError::Decode(format!("invalid timestamp {}", secs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FillMode, TimeInForce};
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_request_uses_terminal_constants() {
        let spec = OrderSpec {
            symbol: "USDJPYm#".to_string(),
            side: TradeSide::Sell,
            volume: dec!(0.25),
            price: dec!(151.234),
            stop_loss: dec!(151.734),
            take_profit: dec!(150.234),
            magic: 1000,
            comment: "note".to_string(),
            time_in_force: TimeInForce::Gtc,
            fill_mode: FillMode::Return,
        };

        let json = serde_json::to_value(OrderSendRequest::from(&spec)).unwrap();

        assert_eq!(json["action"], 1);
        assert_eq!(json["type"], 1);
        assert_eq!(json["type_time"], 0);
        assert_eq!(json["type_filling"], 2);
        assert_eq!(json["symbol"], "USDJPYm#");
        assert_eq!(json["volume"], 0.25);
        assert_eq!(json["price"], 151.234);
    }

    #[test]
    fn test_deal_decoding() {
        let raw = serde_json::json!({
            "ticket": 9001,
            "order": 42,
            "position_id": 42,
            "time": 1_700_000_000,
            "symbol": "EURUSD",
            "type": 1,
            "entry": 1,
            "volume": 0.1,
            "price": 1.0875,
            "profit": 12.5,
            "commission": -0.7
        });

        let deal: Deal = serde_json::from_value::<DealResponse>(raw)
            .unwrap()
            .try_into()
            .unwrap();

        assert_eq!(deal.ticket, 9001);
        assert_eq!(deal.side, Some(TradeSide::Sell));
        assert_eq!(deal.entry, DealEntry::Out);
        assert_eq!(deal.price, dec!(1.0875));
        assert_eq!(deal.net_profit(), dec!(11.8));
        assert_eq!(deal.time.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_deal_with_unknown_entry_is_rejected() {
        let raw = serde_json::json!({
            "ticket": 1, "position_id": 1, "time": 0, "type": 0, "entry": 7,
            "volume": 1, "price": 1, "profit": 0
        });

        let result: Result<Deal, _> = serde_json::from_value::<DealResponse>(raw)
            .unwrap()
            .try_into();

        assert!(matches!(result, Err(SessionError::Decode(_))));
    }
}
