//! Trading gateway core: entry guard, order submission and result resolution.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::models::{
    AccountInfo, Deal, Fill, HistoricalOrder, OrderOutcome, OrderSpec, OrderState, Quote,
    RejectReason, Rejection, TimeInForce, TradeRequest, TradeResult, TradeSide,
};
use crate::session::TerminalSession;

use super::pips::{pip_distance_with_unit, resolve_pip_unit};

/// Outcome of comparing a requested entry price with the live quote.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryCheck {
    pub quote: Quote,
    pub side: TradeSide,
    pub entry_price: Decimal,
    /// Ask for buys, bid for sells
    pub reference_price: Decimal,
    pub pip_unit: Decimal,
    pub distance_pips: u64,
    pub max_slippage_pips: u32,
}

impl EntryCheck {
    /// Boundary inclusive: a distance equal to the allowance is still valid.
    pub fn is_valid(&self) -> bool {
        self.distance_pips <= u64::from(self.max_slippage_pips)
    }

    fn describe(&self) -> String {
        format!(
            "entry={} is {} pips from live {} price {} (max {}); bid={} ask={}",
            self.entry_price,
            self.distance_pips,
            self.side,
            self.reference_price,
            self.max_slippage_pips,
            self.quote.bid,
            self.quote.ask
        )
    }
}

/// Where a position stands in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeStatus {
    /// The terminal knows no order or deal for the ticket.
    Unknown,
    /// The position exists but has no closing deal yet.
    Open { deals: usize },
    /// The order ended without a fill (rejected, canceled or expired).
    NotFilled(OrderState),
    /// The position has an opening and a closing deal.
    Closed(TradeResult),
}

/// Gateway between callers and a trading terminal.
///
/// Holds only read-only configuration; every operation awaits at most two
/// session calls in sequence and never retries.
pub struct TradingGateway<S: TerminalSession> {
    session: S,
    config: GatewayConfig,
}

impl<S: TerminalSession> TradingGateway<S> {
    pub fn new(session: S, config: GatewayConfig) -> Self {
        Self { session, config }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Log in to the trade server.
    pub async fn connect(&self) -> Result<(), GatewayError> {
        self.session.connect().await?;
        info!(
            session = self.session.name(),
            account = %self.config.credentials,
            "Gateway connected"
        );
        Ok(())
    }

    pub async fn disconnect(&self) -> Result<(), GatewayError> {
        self.session.disconnect().await?;
        Ok(())
    }

    /// Live quote for a plain symbol.
    ///
    /// The symbol is upper-cased and the broker suffix appended, the same
    /// terminal name the order is sent under. Plain MetaTrader wrappers
    /// suffix only the order and quote the bare pair, which fails on
    /// brokers that list their symbols under the suffixed name only.
    pub async fn quote(&self, symbol: &str) -> Result<Quote, GatewayError> {
        let symbol = self.config.terminal_symbol(symbol);
        Ok(self.session.get_quote(&symbol).await?)
    }

    /// Compare `entry_price` with a freshly fetched quote.
    pub async fn check_entry(
        &self,
        symbol: &str,
        entry_price: Decimal,
        side: TradeSide,
        max_slippage_pips: u32,
    ) -> Result<EntryCheck, GatewayError> {
        let quote = self.quote(symbol).await?;
        let reference_price = quote.execution_price(side);
        let pip_unit = resolve_pip_unit(quote.digits, entry_price.max(reference_price));
        let distance_pips = pip_distance_with_unit(entry_price, reference_price, pip_unit);

        debug!(
            symbol = %quote.symbol,
            side = %side,
            entry = %entry_price,
            reference = %reference_price,
            distance_pips,
            "Checked entry price"
        );

        Ok(EntryCheck {
            quote,
            side,
            entry_price,
            reference_price,
            pip_unit,
            distance_pips,
            max_slippage_pips,
        })
    }

    /// True if `entry_price` is within `max_slippage_pips` of the live
    /// execution-side price.
    pub async fn is_entry_valid(
        &self,
        symbol: &str,
        entry_price: Decimal,
        side: TradeSide,
        max_slippage_pips: u32,
    ) -> Result<bool, GatewayError> {
        let check = self
            .check_entry(symbol, entry_price, side, max_slippage_pips)
            .await?;
        Ok(check.is_valid())
    }

    /// Terminal order for a request: upper-cased symbol with suffix,
    /// good-till-cancel, configured filling.
    pub fn build_order(&self, request: &TradeRequest) -> OrderSpec {
        OrderSpec {
            symbol: self.config.terminal_symbol(&request.symbol),
            side: request.side,
            volume: request.volume,
            price: request.entry_price,
            stop_loss: request.stop_loss,
            take_profit: request.take_profit,
            magic: request.magic,
            comment: request.note.clone(),
            time_in_force: TimeInForce::Gtc,
            fill_mode: self.config.fill_mode,
        }
    }

    /// Submit a market order once.
    ///
    /// A stale entry price is rejected before the order reaches the terminal.
    /// Terminal rejections are returned as `Ok(OrderOutcome::Rejected)`;
    /// `Err` is reserved for invalid requests and session failures.
    pub async fn submit(&self, request: &TradeRequest) -> Result<OrderOutcome, GatewayError> {
        request.validate().map_err(GatewayError::InvalidRequest)?;

        let check = self
            .check_entry(
                &request.symbol,
                request.entry_price,
                request.side,
                request.max_slippage_pips,
            )
            .await?;

        if !check.is_valid() {
            warn!(
                symbol = %check.quote.symbol,
                entry = %request.entry_price,
                reference = %check.reference_price,
                distance_pips = check.distance_pips,
                max_pips = request.max_slippage_pips,
                "Entry price is stale, order not sent"
            );
            return Ok(OrderOutcome::Rejected(Rejection {
                reason: RejectReason::StalePrice,
                raw_code: None,
                message: check.describe(),
            }));
        }

        let order = self.build_order(request);
        let reply = self.session.submit_order(&order).await?;
        let outcome = OrderOutcome::from_response(reply.as_ref());

        match &outcome {
            OrderOutcome::Accepted(fill) => info!(
                symbol = %order.symbol,
                side = %order.side,
                volume = %fill.volume,
                price = %fill.fill_price,
                ticket = fill.ticket,
                "Order accepted"
            ),
            OrderOutcome::Rejected(rejection) => warn!(
                symbol = %order.symbol,
                side = %order.side,
                reason = %rejection.reason,
                retcode = ?rejection.raw_code,
                message = %rejection.message,
                "Order rejected"
            ),
        }

        Ok(outcome)
    }

    /// Submit a market order once, turning every rejection into its error kind.
    pub async fn open_trade(&self, request: &TradeRequest) -> Result<Fill, GatewayError> {
        match self.submit(request).await? {
            OrderOutcome::Accepted(fill) => Ok(fill),
            OrderOutcome::Rejected(rejection) => Err(rejection.into()),
        }
    }

    /// Realized result of a position, `None` until it has at least two deals.
    ///
    /// `None` covers both an open position and an unknown ticket; use
    /// [`TradingGateway::trade_status`] to tell them apart. With partial
    /// closes only the last deal is reported. The closing deal is the record
    /// fetched by its own ticket; when that lookup finds nothing the result
    /// is `None`.
    pub async fn resolve_result(
        &self,
        order_ticket: u64,
    ) -> Result<Option<TradeResult>, GatewayError> {
        let deals = self.session.deals_by_position(order_ticket).await?;
        self.closing_result(order_ticket, &deals).await
    }

    /// Lifecycle state of a position, distinguishing unknown tickets from
    /// open positions.
    pub async fn trade_status(&self, order_ticket: u64) -> Result<TradeStatus, GatewayError> {
        let deals = self.session.deals_by_position(order_ticket).await?;

        if let Some(result) = self.closing_result(order_ticket, &deals).await? {
            return Ok(TradeStatus::Closed(result));
        }
        if !deals.is_empty() {
            return Ok(TradeStatus::Open { deals: deals.len() });
        }

        match self.session.order_by_ticket(order_ticket).await? {
            Some(order) if order.state.is_unfilled() => Ok(TradeStatus::NotFilled(order.state)),
            Some(_) => Ok(TradeStatus::Open { deals: 0 }),
            None => Ok(TradeStatus::Unknown),
        }
    }

    async fn closing_result(
        &self,
        order_ticket: u64,
        deals: &[Deal],
    ) -> Result<Option<TradeResult>, GatewayError> {
        if deals.len() < 2 {
            return Ok(None);
        }
        let Some(last) = deals.last() else {
            return Ok(None);
        };

        let Some(closing) = self.session.deal_by_ticket(last.ticket).await? else {
            warn!(
                deal = last.ticket,
                position = order_ticket,
                "Closing deal listed for position but not found by ticket"
            );
            return Ok(None);
        };

        if deals.len() > 2 {
            debug!(
                position = order_ticket,
                deals = deals.len(),
                "Position closed in several steps, reporting last deal only"
            );
        }

        Ok(Some(TradeResult::new(order_ticket, closing, deals.len())))
    }

    /// All deals of a position, in terminal order.
    pub async fn order_deals(&self, order_ticket: u64) -> Result<Vec<Deal>, GatewayError> {
        Ok(self.session.deals_by_position(order_ticket).await?)
    }

    pub async fn deal(&self, deal_ticket: u64) -> Result<Option<Deal>, GatewayError> {
        Ok(self.session.deal_by_ticket(deal_ticket).await?)
    }

    pub async fn order(&self, order_ticket: u64) -> Result<Option<HistoricalOrder>, GatewayError> {
        Ok(self.session.order_by_ticket(order_ticket).await?)
    }

    /// Deals executed within `[from, to]` for symbols matching `group`.
    pub async fn history(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        group: &str,
    ) -> Result<Vec<Deal>, GatewayError> {
        if from > to {
            return Err(GatewayError::InvalidRequest(format!(
                "history range starts after it ends: {} > {}",
                from, to
            )));
        }
        Ok(self.session.deals_in_range(from, to, group).await?)
    }

    pub async fn account(&self) -> Result<AccountInfo, GatewayError> {
        Ok(self.session.account_info().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::models::{
        retcode, sample_deal, DealEntry, FillMode, OrderResponse, OrderState,
    };
    use crate::gateway::pip_distance;
    use crate::session::{MockTerminalSession, SessionCall, SessionError};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use tokio_test::assert_ok;

    fn config() -> GatewayConfig {
        GatewayConfig::new(Credentials::new("Broker-Demo", 5012345, "pw"))
    }

    fn eurusd(bid: Decimal, ask: Decimal) -> Quote {
        Quote {
            symbol: "EURUSD".to_string(),
            bid,
            ask,
            digits: None,
        }
    }

    fn reply(code: u32, comment: &str) -> OrderResponse {
        OrderResponse {
            retcode: code,
            deal: 900,
            order: 800,
            volume: dec!(0.1),
            price: dec!(1.2346),
            bid: dec!(1.2344),
            ask: dec!(1.2346),
            comment: comment.to_string(),
        }
    }

    fn buy_at(entry: Decimal) -> TradeRequest {
        TradeRequest::new("EURUSD", TradeSide::Buy, dec!(0.1), entry, dec!(1.2200), dec!(1.2500))
    }

    #[tokio::test]
    async fn test_entry_validity_is_boundary_inclusive() {
        let session = MockTerminalSession::new().with_quote(eurusd(dec!(1.2340), dec!(1.2350)));
        let gateway = TradingGateway::new(session, config());

        // 10 pips from ask
        assert!(gateway.is_entry_valid("EURUSD", dec!(1.2340), TradeSide::Buy, 10).await.unwrap());
        // 11 pips from ask
        assert!(!gateway.is_entry_valid("EURUSD", dec!(1.2339), TradeSide::Buy, 10).await.unwrap());
        // sells compare against bid
        assert!(gateway.is_entry_valid("EURUSD", dec!(1.2340), TradeSide::Sell, 0).await.unwrap());
        assert!(!gateway.is_entry_valid("EURUSD", dec!(1.2350), TradeSide::Sell, 9).await.unwrap());
    }

    #[tokio::test]
    async fn test_each_check_fetches_a_fresh_quote() {
        let session = MockTerminalSession::new().with_quote(eurusd(dec!(1.2340), dec!(1.2350)));
        let gateway = TradingGateway::new(session, config());

        for _ in 0..3 {
            assert_ok!(gateway.is_entry_valid("EURUSD", dec!(1.2350), TradeSide::Buy, 1).await);
        }

        let quote_calls = gateway
            .session()
            .calls()
            .into_iter()
            .filter(|c| matches!(c, SessionCall::GetQuote(_)))
            .count();
        assert_eq!(quote_calls, 3);
    }

    #[tokio::test]
    async fn test_digits_metadata_overrides_heuristic() {
        // 4-decimal instrument priced above 10: heuristic would use 0.01
        let quote = Quote {
            symbol: "USDMXN".to_string(),
            bid: dec!(17.1230),
            ask: dec!(17.1250),
            digits: Some(4),
        };
        let session = MockTerminalSession::new().with_quote(quote);
        let gateway = TradingGateway::new(session, config());

        let check = gateway
            .check_entry("USDMXN", dec!(17.1200), TradeSide::Buy, 10)
            .await
            .unwrap();

        assert_eq!(check.pip_unit, dec!(0.0001));
        assert_eq!(check.distance_pips, 50);
        assert!(!check.is_valid());
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_typed() {
        let gateway = TradingGateway::new(MockTerminalSession::new(), config());

        let err = gateway
            .is_entry_valid("XXXYYY", dec!(1), TradeSide::Buy, 10)
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::SymbolNotFound("XXXYYY".to_string()));
    }

    #[tokio::test]
    async fn test_stale_price_never_reaches_terminal() {
        let session = MockTerminalSession::new()
            .with_quote(eurusd(dec!(1.2340), dec!(1.2350)))
            .with_order_reply(Some(reply(retcode::DONE, "done")));
        let gateway = TradingGateway::new(session, config());

        let outcome = gateway.submit(&buy_at(dec!(1.2300))).await.unwrap();

        assert_eq!(outcome.reject_reason(), Some(RejectReason::StalePrice));
        assert!(gateway.session().submitted_orders().is_empty());

        let err = gateway.open_trade(&buy_at(dec!(1.2300))).await.unwrap_err();
        assert!(matches!(err, GatewayError::StalePrice(_)));
        assert!(gateway.session().submitted_orders().is_empty());
    }

    #[tokio::test]
    async fn test_accepted_order_carries_ticket_and_fill() {
        let session = MockTerminalSession::new()
            .with_quote(Quote {
                symbol: "EURUSDM#".to_string(),
                bid: dec!(1.2344),
                ask: dec!(1.2346),
                digits: Some(5),
            })
            .with_order_reply(Some(reply(retcode::DONE, "Request executed")));
        let gateway = TradingGateway::new(
            session,
            config().with_symbol_suffix("M#").with_fill_mode(FillMode::Fok),
        );

        let request = TradeRequest::new("eurusd", TradeSide::Buy, dec!(0.1), dec!(1.2345), dec!(1.2300), dec!(1.2400))
            .with_note("breakout")
            .with_magic(77);

        let fill = gateway.open_trade(&request).await.unwrap();
        assert_eq!(fill.ticket, 800);
        assert_eq!(fill.fill_price, dec!(1.2346));
        assert_eq!(fill.raw_code, 10009);

        let sent = gateway.session().submitted_orders();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].symbol, "EURUSDM#");
        assert_eq!(sent[0].fill_mode, FillMode::Fok);
        assert_eq!(sent[0].time_in_force, TimeInForce::Gtc);
        assert_eq!(sent[0].comment, "breakout");
        assert_eq!(sent[0].magic, 77);
        assert_eq!(sent[0].price, dec!(1.2345));
    }

    #[tokio::test]
    async fn test_rejection_kinds() {
        let cases = [
            (10027, RejectReason::AutoTradingDisabled),
            (10016, RejectReason::InvalidStops),
            (10031, RejectReason::Other),
        ];

        for (code, expected) in cases {
            let session = MockTerminalSession::new()
                .with_quote(eurusd(dec!(1.2344), dec!(1.2346)))
                .with_order_reply(Some(reply(code, "broker comment")));
            let gateway = TradingGateway::new(session, config());

            match gateway.submit(&buy_at(dec!(1.2346))).await.unwrap() {
                OrderOutcome::Rejected(r) => {
                    assert_eq!(r.reason, expected);
                    assert_eq!(r.raw_code, Some(code));
                    assert_eq!(r.message, "broker comment");
                }
                other => panic!("expected rejection for {}, got {:?}", code, other),
            }
        }
    }

    #[tokio::test]
    async fn test_open_trade_error_kinds() {
        let session = MockTerminalSession::new()
            .with_quote(eurusd(dec!(1.2344), dec!(1.2346)))
            .with_order_reply(Some(reply(10027, "")));
        let gateway = TradingGateway::new(session, config());
        assert_eq!(
            gateway.open_trade(&buy_at(dec!(1.2346))).await.unwrap_err(),
            GatewayError::AutoTradingDisabled
        );

        let session = MockTerminalSession::new()
            .with_quote(eurusd(dec!(1.2344), dec!(1.2346)))
            .with_order_reply(Some(reply(10006, "Rejected by dealer")));
        let gateway = TradingGateway::new(session, config());
        assert_eq!(
            gateway.open_trade(&buy_at(dec!(1.2346))).await.unwrap_err(),
            GatewayError::OtherRejection {
                code: 10006,
                message: "Rejected by dealer".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_reply_is_no_response() {
        let session = MockTerminalSession::new()
            .with_quote(eurusd(dec!(1.2344), dec!(1.2346)))
            .with_order_reply(None);
        let gateway = TradingGateway::new(session, config());

        let outcome = gateway.submit(&buy_at(dec!(1.2346))).await.unwrap();
        assert_eq!(outcome.reject_reason(), Some(RejectReason::NoResponse));
        assert_eq!(gateway.session().submitted_orders().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_request_is_not_sent() {
        let session = MockTerminalSession::new().with_quote(eurusd(dec!(1.2344), dec!(1.2346)));
        let gateway = TradingGateway::new(session, config());

        let request = TradeRequest::new("EURUSD", TradeSide::Buy, dec!(-1), dec!(1.2346), dec!(1.2), dec!(1.3));
        let err = gateway.submit(&request).await.unwrap_err();

        assert!(matches!(err, GatewayError::InvalidRequest(_)));
        assert!(gateway.session().calls().is_empty());
    }

    #[tokio::test]
    async fn test_session_failure_propagates_unchanged() {
        let session = MockTerminalSession::new()
            .failing_with(SessionError::Timeout(std::time::Duration::from_secs(60)));
        let gateway = TradingGateway::new(session, config());

        let err = gateway.submit(&buy_at(dec!(1.2346))).await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::Connection(SessionError::Timeout(std::time::Duration::from_secs(60)))
        );
    }

    #[tokio::test]
    async fn test_resolve_needs_two_deals() {
        let session = MockTerminalSession::new()
            .with_position_deals(1, vec![sample_deal(1, 1, DealEntry::In, dec!(0))]);
        let gateway = TradingGateway::new(session, config());

        assert_eq!(gateway.resolve_result(1).await.unwrap(), None);
        assert_eq!(gateway.resolve_result(999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_resolve_returns_last_deal_refetched() {
        let opening = sample_deal(1, 1, DealEntry::In, dec!(0));
        let listed_close = sample_deal(2, 1, DealEntry::Out, dec!(0));
        let mut full_close = listed_close.clone();
        full_close.profit = dec!(42.10);
        full_close.commission = dec!(-0.10);

        let session = MockTerminalSession::new()
            .with_position_deals(1, vec![opening, listed_close])
            .with_deal(full_close.clone());
        let gateway = TradingGateway::new(session, config());

        let result = gateway.resolve_result(1).await.unwrap().unwrap();
        assert_eq!(result.closing_deal.ticket, 2);
        assert_eq!(result.closing_deal, full_close);
        assert_eq!(result.net_profit, dec!(42.00));
        assert_eq!(result.deal_count, 2);

        assert!(gateway.session().calls().contains(&SessionCall::DealByTicket(2)));

        // unchanged history, identical answer
        let again = gateway.resolve_result(1).await.unwrap().unwrap();
        assert_eq!(again, result);
    }

    #[tokio::test]
    async fn test_partial_closes_report_last_deal() {
        let session = MockTerminalSession::new().with_position_deals(
            5,
            vec![
                sample_deal(10, 5, DealEntry::In, dec!(0)),
                sample_deal(11, 5, DealEntry::Out, dec!(15)),
                sample_deal(12, 5, DealEntry::Out, dec!(-4)),
            ],
        );
        let gateway = TradingGateway::new(session, config());

        let result = gateway.resolve_result(5).await.unwrap().unwrap();
        assert_eq!(result.closing_deal.ticket, 12);
        assert_eq!(result.net_profit, dec!(-4));
        assert!(result.is_partial());
    }

    fn historical_order(ticket: u64, state: OrderState) -> HistoricalOrder {
        HistoricalOrder {
            ticket,
            position_id: ticket,
            symbol: "EURUSD".to_string(),
            side: Some(TradeSide::Buy),
            state,
            time_setup: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            time_done: None,
            volume_initial: dec!(0.1),
            volume_current: dec!(0.1),
            price_open: dec!(1.1),
            stop_loss: dec!(1.09),
            take_profit: dec!(1.12),
            magic: 1000,
            comment: String::new(),
        }
    }

    #[tokio::test]
    async fn test_trade_status_distinguishes_unknown_from_open() {
        let session = MockTerminalSession::new()
            .with_order(historical_order(3, OrderState::Placed))
            .with_position_deals(1, vec![sample_deal(1, 1, DealEntry::In, dec!(0))])
            .with_position_deals(
                2,
                vec![
                    sample_deal(20, 2, DealEntry::In, dec!(0)),
                    sample_deal(21, 2, DealEntry::Out, dec!(3)),
                ],
            );
        let gateway = TradingGateway::new(session, config());

        assert_eq!(gateway.trade_status(1).await.unwrap(), TradeStatus::Open { deals: 1 });
        assert_eq!(gateway.trade_status(3).await.unwrap(), TradeStatus::Open { deals: 0 });
        assert_eq!(gateway.trade_status(404).await.unwrap(), TradeStatus::Unknown);
        assert!(matches!(gateway.trade_status(2).await.unwrap(), TradeStatus::Closed(r) if r.closing_deal.ticket == 21));
    }

    #[tokio::test]
    async fn test_trade_status_of_orders_that_never_filled() {
        let session = MockTerminalSession::new()
            .with_order(historical_order(7, OrderState::Rejected))
            .with_order(historical_order(8, OrderState::Canceled))
            .with_order(historical_order(9, OrderState::Expired))
            .with_order(historical_order(10, OrderState::Partial));
        let gateway = TradingGateway::new(session, config());

        assert_eq!(
            gateway.trade_status(7).await.unwrap(),
            TradeStatus::NotFilled(OrderState::Rejected)
        );
        assert_eq!(
            gateway.trade_status(8).await.unwrap(),
            TradeStatus::NotFilled(OrderState::Canceled)
        );
        assert_eq!(
            gateway.trade_status(9).await.unwrap(),
            TradeStatus::NotFilled(OrderState::Expired)
        );
        assert_eq!(gateway.trade_status(10).await.unwrap(), TradeStatus::Open { deals: 0 });
    }

    #[tokio::test]
    async fn test_closing_deal_missing_by_ticket_gives_no_result() {
        let session = MockTerminalSession::new()
            .with_position_deals(
                1,
                vec![
                    sample_deal(1, 1, DealEntry::In, dec!(0)),
                    sample_deal(2, 1, DealEntry::Out, dec!(12)),
                ],
            )
            .without_deal(2);
        let gateway = TradingGateway::new(session, config());

        assert_eq!(gateway.resolve_result(1).await.unwrap(), None);
        assert!(gateway.session().calls().contains(&SessionCall::DealByTicket(2)));
        assert_eq!(gateway.trade_status(1).await.unwrap(), TradeStatus::Open { deals: 2 });
    }

    #[tokio::test]
    async fn test_account_margins() {
        let account = AccountInfo {
            login: 5012345,
            server: "Broker-Demo".to_string(),
            currency: "USD".to_string(),
            leverage: 500,
            balance: dec!(10000),
            equity: dec!(10125.50),
            profit: dec!(125.50),
            margin: dec!(220),
            margin_free: dec!(9905.50),
            margin_level: dec!(4602.50),
        };
        let session = MockTerminalSession::new().with_account(account.clone());
        let gateway = TradingGateway::new(session, config());

        let fetched = gateway.account().await.unwrap();
        assert_eq!(fetched, account);

        let margins = fetched.margins();
        assert_eq!(margins.used, dec!(220));
        assert_eq!(margins.free, dec!(9905.50));
        assert_eq!(margins.level, dec!(4602.50));
        assert_eq!(gateway.session().calls(), vec![SessionCall::AccountInfo]);
    }

    #[tokio::test]
    async fn test_entry_check_agrees_with_pip_distance_near_ten() {
        let quote = Quote {
            symbol: "USDTRY".to_string(),
            bid: dec!(9.9995),
            ask: dec!(10.0005),
            digits: None,
        };
        let gateway = TradingGateway::new(MockTerminalSession::new().with_quote(quote), config());

        let check = gateway
            .check_entry("USDTRY", dec!(9.9990), TradeSide::Buy, 10)
            .await
            .unwrap();

        assert_eq!(check.distance_pips, pip_distance(dec!(9.9990), dec!(10.0005)));
        assert_eq!(check.pip_unit, dec!(0.01));
        assert!(check.is_valid());
    }

    #[tokio::test]
    async fn test_history_range_must_be_ordered() {
        let session = MockTerminalSession::new().with_position_deals(
            1,
            vec![
                sample_deal(1, 1, DealEntry::In, dec!(0)),
                sample_deal(2, 1, DealEntry::Out, dec!(5)),
            ],
        );
        let gateway = TradingGateway::new(session, config());
        let from = Utc.timestamp_opt(1_600_000_000, 0).unwrap();
        let to = Utc.timestamp_opt(1_800_000_000, 0).unwrap();

        let deals = gateway.history(from, to, "*").await.unwrap();
        assert_eq!(deals.iter().map(|d| d.ticket).collect::<Vec<_>>(), vec![1, 2]);

        let err = gateway.history(to, from, "*").await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidRequest(_)));
    }
}
