//! MetaTrader 5 trading gateway.
//!
//! Validates entry prices against live quotes, submits market orders once
//! and classifies the terminal's reply, then resolves realized results from
//! deal history. All terminal access goes through a [`TerminalSession`].

pub mod config;
pub mod error;
pub mod gateway;
pub mod history;
pub mod models;
pub mod session;

pub use config::{Credentials, GatewayConfig, SessionConfig};
pub use error::GatewayError;
pub use gateway::{pip_distance, EntryCheck, TradeStatus, TradingGateway};
pub use history::DealStatistics;
pub use models::{OrderOutcome, RejectReason, TradeRequest, TradeResult, TradeSide};
pub use session::{HttpTerminalSession, MockTerminalSession, SessionError, TerminalSession};
