//! Terminal session: the gateway's only route to the trading terminal.
//!
//! - [`TerminalSession`]: the capability the gateway is generic over
//! - [`HttpTerminalSession`]: JSON-over-HTTP session for a terminal bridge
//! - [`MockTerminalSession`]: in-memory session that records every call

mod http;
mod mock;
mod types;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{AccountInfo, Deal, HistoricalOrder, OrderResponse, OrderSpec, Quote};

pub use http::HttpTerminalSession;
pub use mock::{MockTerminalSession, SessionCall};

/// Errors raised by a terminal session.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// Transport-level failure reaching the terminal.
    #[error("connection to terminal failed: {0}")]
    Connection(String),

    /// The terminal did not answer within the session timeout.
    #[error("terminal request timed out after {0:?}")]
    Timeout(Duration),

    /// Login rejected by the trade server.
    #[error("terminal login failed: {0}")]
    Authentication(String),

    /// The terminal does not know the symbol.
    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    /// The terminal answered with an error.
    #[error("terminal error {status}: {message}")]
    Terminal {
        /// Status reported by the terminal.
        status: u16,
        /// Error text from the terminal.
        message: String,
    },

    /// The terminal answered with something we could not read.
    #[error("malformed terminal response: {0}")]
    Decode(String),
}

/// Capability to talk to a trading terminal.
///
/// Every method is a single call against the terminal; implementations must
/// not retry. Ordering of `deals_by_position` is the terminal's own
/// (chronological) ordering and is relied on by result resolution.
#[async_trait]
pub trait TerminalSession: Send + Sync {
    /// Log in with the session's credentials.
    async fn connect(&self) -> Result<(), SessionError>;

    /// Close the terminal connection.
    async fn disconnect(&self) -> Result<(), SessionError>;

    /// Current bid/ask for a full terminal symbol.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SymbolNotFound`] if the terminal does not know the symbol.
    async fn get_quote(&self, symbol: &str) -> Result<Quote, SessionError>;

    /// Send a market order. `Ok(None)` means the terminal produced no result.
    async fn submit_order(&self, order: &OrderSpec) -> Result<Option<OrderResponse>, SessionError>;

    /// All deals linked to a position, in terminal order. Empty if none.
    async fn deals_by_position(&self, position_ticket: u64) -> Result<Vec<Deal>, SessionError>;

    /// A single deal by its own ticket.
    async fn deal_by_ticket(&self, deal_ticket: u64) -> Result<Option<Deal>, SessionError>;

    /// A single historical order by its ticket.
    async fn order_by_ticket(&self, order_ticket: u64)
        -> Result<Option<HistoricalOrder>, SessionError>;

    /// Deals executed in `[from, to]` whose symbol matches `group`
    /// (terminal group syntax, `"*"` for all).
    async fn deals_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        group: &str,
    ) -> Result<Vec<Deal>, SessionError>;

    /// Account snapshot.
    async fn account_info(&self) -> Result<AccountInfo, SessionError>;

    /// Session name for logging.
    fn name(&self) -> &'static str;
}
