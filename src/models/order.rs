//! Order models: the request sent to the terminal, its reply, and the typed
//! outcome the gateway hands back to callers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::TradeSide;

/// Terminal return codes the gateway knows by name.
pub mod retcode {
    /// Request completed, deal done.
    pub const DONE: u32 = 10009;
    /// Invalid stop loss or take profit.
    pub const INVALID_STOPS: u32 = 10016;
    /// Algorithmic trading disabled in the client terminal.
    pub const AUTO_TRADING_DISABLED: u32 = 10027;

    /// Human-readable description of a terminal return code.
    pub fn describe(code: u32) -> Option<&'static str> {
        let text = match code {
            10004 => "requote",
            10006 => "request rejected",
            10007 => "request canceled by trader",
            10008 => "order placed",
            10009 => "request completed",
            10010 => "only part of the request was completed",
            10011 => "request processing error",
            10012 => "request canceled by timeout",
            10013 => "invalid request",
            10014 => "invalid volume in the request",
            10015 => "invalid price in the request",
            10016 => "invalid stops in the request",
            10017 => "trade is disabled",
            10018 => "market is closed",
            10019 => "not enough money to complete the request",
            10020 => "prices changed",
            10021 => "no quotes to process the request",
            10024 => "too frequent requests",
            10026 => "autotrading disabled by server",
            10027 => "autotrading disabled by client terminal",
            10030 => "invalid order filling type",
            10031 => "no connection with the trade server",
            _ => return None,
        };
        Some(text)
    }
}

/// How the terminal may fill a market order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FillMode {
    /// Immediate-or-cancel: fill what is available, cancel the rest
    #[default]
    Ioc,
    /// Fill-or-kill: fill the full volume or nothing
    Fok,
    /// Return: fill what is available, leave the rest working
    Return,
}

impl FillMode {
    /// Terminal filling constant.
    pub fn code(&self) -> u32 {
        match self {
            FillMode::Fok => 0,
            FillMode::Ioc => 1,
            FillMode::Return => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FillMode::Ioc => "IOC",
            FillMode::Fok => "FOK",
            FillMode::Return => "RETURN",
        }
    }
}

impl fmt::Display for FillMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FillMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "IOC" => Ok(FillMode::Ioc),
            "FOK" => Ok(FillMode::Fok),
            "RETURN" => Ok(FillMode::Return),
            other => Err(format!(
                "unknown filling mode '{}', expected IOC, FOK or RETURN",
                other
            )),
        }
    }
}

/// Order lifetime. Market executions from the gateway are always good-till-cancel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    #[default]
    Gtc,
}

impl TimeInForce {
    pub fn code(&self) -> u32 {
        match self {
            TimeInForce::Gtc => 0,
        }
    }
}

/// Market-execution order exactly as it is handed to the terminal session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSpec {
    /// Full terminal symbol, upper-cased with the broker suffix appended
    pub symbol: String,
    pub side: TradeSide,
    pub volume: Decimal,
    /// Requested price, used by the terminal as the deviation reference
    pub price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub magic: u64,
    pub comment: String,
    pub time_in_force: TimeInForce,
    pub fill_mode: FillMode,
}

/// Terminal reply to an order submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResponse {
    /// Terminal return code
    pub retcode: u32,

    /// Deal ticket, if a deal was executed
    #[serde(default)]
    pub deal: u64,

    /// Order ticket (equals the position id for market executions)
    #[serde(default)]
    pub order: u64,

    /// Executed volume
    #[serde(default)]
    pub volume: Decimal,

    /// Execution price
    #[serde(default)]
    pub price: Decimal,

    #[serde(default)]
    pub bid: Decimal,

    #[serde(default)]
    pub ask: Decimal,

    /// Terminal comment on the result
    #[serde(default)]
    pub comment: String,
}

/// Why an order did not go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    /// Entry price drifted further from the live price than allowed
    StalePrice,
    /// The terminal returned nothing
    NoResponse,
    /// Algorithmic trading is switched off in the terminal
    AutoTradingDisabled,
    /// Stop loss or take profit rejected by the server
    InvalidStops,
    /// Any other non-success return code
    Other,
}

impl RejectReason {
    /// Classify a non-success terminal return code.
    pub fn from_retcode(code: u32) -> Self {
        match code {
            retcode::AUTO_TRADING_DISABLED => RejectReason::AutoTradingDisabled,
            retcode::INVALID_STOPS => RejectReason::InvalidStops,
            _ => RejectReason::Other,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::StalePrice => "stale price",
            RejectReason::NoResponse => "no response",
            RejectReason::AutoTradingDisabled => "auto trading disabled",
            RejectReason::InvalidStops => "invalid stops",
            RejectReason::Other => "rejected",
        };
        f.write_str(s)
    }
}

/// Accepted market execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    /// Order/position ticket, the key for later result resolution
    pub ticket: u64,
    /// Deal ticket of the opening execution
    pub deal: u64,
    pub fill_price: Decimal,
    pub volume: Decimal,
    pub raw_code: u32,
}

/// Rejected submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub reason: RejectReason,
    /// Terminal return code, absent when the terminal was never asked or never answered
    pub raw_code: Option<u32>,
    pub message: String,
}

/// Result of a single submission attempt. The terminal call is atomic:
/// accepted or rejected, never partially tracked here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderOutcome {
    Accepted(Fill),
    Rejected(Rejection),
}

impl OrderOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, OrderOutcome::Accepted(_))
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            OrderOutcome::Accepted(_) => None,
            OrderOutcome::Rejected(r) => Some(r.reason),
        }
    }

    /// Interpret a terminal reply. `None` means the terminal gave no answer.
    pub fn from_response(response: Option<&OrderResponse>) -> Self {
        let Some(resp) = response else {
            return OrderOutcome::Rejected(Rejection {
                reason: RejectReason::NoResponse,
                raw_code: None,
                message: "terminal returned no result for the order".to_string(),
            });
        };

        if resp.retcode == retcode::DONE {
            return OrderOutcome::Accepted(Fill {
                ticket: resp.order,
                deal: resp.deal,
                fill_price: resp.price,
                volume: resp.volume,
                raw_code: resp.retcode,
            });
        }

        let reason = RejectReason::from_retcode(resp.retcode);
        let message = if resp.comment.trim().is_empty() {
            retcode::describe(resp.retcode)
                .unwrap_or("unknown return code")
                .to_string()
        } else {
            resp.comment.clone()
        };

        OrderOutcome::Rejected(Rejection {
            reason,
            raw_code: Some(resp.retcode),
            message,
        })
    }
}

/// Lifecycle state of a historical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderState {
    Started,
    Placed,
    Canceled,
    Partial,
    Filled,
    Rejected,
    Expired,
    Other(u32),
}

impl OrderState {
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => OrderState::Started,
            1 => OrderState::Placed,
            2 => OrderState::Canceled,
            3 => OrderState::Partial,
            4 => OrderState::Filled,
            5 => OrderState::Rejected,
            6 => OrderState::Expired,
            other => OrderState::Other(other),
        }
    }

    /// The order is finished and never produced a position.
    pub fn is_unfilled(&self) -> bool {
        matches!(
            self,
            OrderState::Canceled | OrderState::Rejected | OrderState::Expired
        )
    }
}

/// Order record from the terminal's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalOrder {
    pub ticket: u64,
    pub position_id: u64,
    pub symbol: String,
    pub side: Option<TradeSide>,
    pub state: OrderState,
    pub time_setup: DateTime<Utc>,
    pub time_done: Option<DateTime<Utc>>,
    pub volume_initial: Decimal,
    pub volume_current: Decimal,
    pub price_open: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub magic: u64,
    pub comment: String,
}
