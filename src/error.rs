//! Gateway error taxonomy.
//!
//! Every failure kind is its own variant so callers can branch on it
//! (widen stops on [`GatewayError::InvalidStops`], alert an operator on
//! [`GatewayError::AutoTradingDisabled`], ...).

use crate::models::{RejectReason, Rejection};
use crate::session::SessionError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    /// Entry price drifted further from the live price than allowed.
    #[error("entry price is invalid: {0}")]
    StalePrice(String),

    /// The terminal does not know the symbol.
    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    /// The terminal returned no result for the order.
    #[error("failed to open trade, terminal returned no result: {0}")]
    NoResponse(String),

    /// Algorithmic trading is disabled in the terminal.
    #[error("failed to open trade because AutoTrading is disabled")]
    AutoTradingDisabled,

    /// Stop loss or take profit rejected.
    #[error("failed to open trade due to invalid stops")]
    InvalidStops,

    /// Any other terminal rejection.
    #[error("terminal rejected the trade: retcode={code} [{message}]")]
    OtherRejection {
        /// Terminal return code.
        code: u32,
        /// Terminal comment.
        message: String,
    },

    /// The request failed local validation and was never sent.
    #[error("invalid trade request: {0}")]
    InvalidRequest(String),

    /// Session failure, propagated unchanged.
    #[error(transparent)]
    Connection(SessionError),
}

impl From<SessionError> for GatewayError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::SymbolNotFound(symbol) => GatewayError::SymbolNotFound(symbol),
            other => GatewayError::Connection(other),
        }
    }
}

impl From<Rejection> for GatewayError {
    fn from(r: Rejection) -> Self {
        match r.reason {
            RejectReason::StalePrice => GatewayError::StalePrice(r.message),
            RejectReason::NoResponse => GatewayError::NoResponse(r.message),
            RejectReason::AutoTradingDisabled => GatewayError::AutoTradingDisabled,
            RejectReason::InvalidStops => GatewayError::InvalidStops,
            RejectReason::Other => GatewayError::OtherRejection {
                code: r.raw_code.unwrap_or_default(),
                message: r.message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_not_found_is_lifted() {
        let err: GatewayError = SessionError::SymbolNotFound("XAUUSD".to_string()).into();
        assert_eq!(err, GatewayError::SymbolNotFound("XAUUSD".to_string()));

        let err: GatewayError = SessionError::Connection("reset".to_string()).into();
        assert!(matches!(err, GatewayError::Connection(SessionError::Connection(_))));
        assert_eq!(err.to_string(), "connection to terminal failed: reset");
    }

    #[test]
    fn test_rejection_mapping_keeps_code_and_message() {
        let err: GatewayError = Rejection {
            reason: RejectReason::Other,
            raw_code: Some(10019),
            message: "No money".to_string(),
        }
        .into();

        assert_eq!(
            err,
            GatewayError::OtherRejection {
                code: 10019,
                message: "No money".to_string()
            }
        );
        assert_eq!(err.to_string(), "terminal rejected the trade: retcode=10019 [No money]");
    }
}
