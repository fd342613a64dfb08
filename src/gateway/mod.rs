//! Trading gateway.
//!
//! - [`pips`]: price distance in pips
//! - [`TradingGateway`]: entry validation, order submission and trade result
//!   resolution over any [`TerminalSession`](crate::session::TerminalSession)

mod core;
pub mod pips;

pub use self::core::{EntryCheck, TradeStatus, TradingGateway};
pub use pips::{pip_distance, pip_distance_with_unit, pip_unit_for_digits, resolve_pip_unit};
