//! In-memory terminal session for tests.
//!
//! Serves canned quotes, order replies and deal history, and records every
//! call made against it so tests can assert what the gateway did (and did
//! not) ask the terminal.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{AccountInfo, Deal, HistoricalOrder, OrderResponse, OrderSpec, Quote};

use super::{SessionError, TerminalSession};

/// A call received by [`MockTerminalSession`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCall {
    Connect,
    Disconnect,
    GetQuote(String),
    SubmitOrder(OrderSpec),
    DealsByPosition(u64),
    DealByTicket(u64),
    OrderByTicket(u64),
    DealsInRange(String),
    AccountInfo,
}

#[derive(Debug, Default)]
struct MockState {
    quotes: HashMap<String, Quote>,
    order_reply: Option<OrderResponse>,
    position_deals: HashMap<u64, Vec<Deal>>,
    deals: HashMap<u64, Deal>,
    orders: HashMap<u64, HistoricalOrder>,
    account: Option<AccountInfo>,
    failure: Option<SessionError>,
}

/// Terminal session backed by canned data.
#[derive(Debug, Default)]
pub struct MockTerminalSession {
    state: Mutex<MockState>,
    calls: Mutex<Vec<SessionCall>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockTerminalSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `quote` for its symbol.
    pub fn with_quote(self, quote: Quote) -> Self {
        lock(&self.state).quotes.insert(quote.symbol.clone(), quote);
        self
    }

    /// Reply to every order submission with `reply` (`None` = no answer).
    pub fn with_order_reply(self, reply: Option<OrderResponse>) -> Self {
        lock(&self.state).order_reply = reply;
        self
    }

    /// Link `deals` to `position`, in the given order. Each deal is also
    /// reachable by its own ticket.
    pub fn with_position_deals(self, position: u64, deals: Vec<Deal>) -> Self {
        {
            let mut state = lock(&self.state);
            for deal in &deals {
                state.deals.insert(deal.ticket, deal.clone());
            }
            state.position_deals.insert(position, deals);
        }
        self
    }

    /// Replace the record served for a single deal ticket.
    pub fn with_deal(self, deal: Deal) -> Self {
        lock(&self.state).deals.insert(deal.ticket, deal);
        self
    }

    /// Make a deal unreachable by ticket while it stays in its position's
    /// listing.
    pub fn without_deal(self, deal_ticket: u64) -> Self {
        lock(&self.state).deals.remove(&deal_ticket);
        self
    }

    pub fn with_order(self, order: HistoricalOrder) -> Self {
        lock(&self.state).orders.insert(order.ticket, order);
        self
    }

    pub fn with_account(self, account: AccountInfo) -> Self {
        lock(&self.state).account = Some(account);
        self
    }

    /// Fail every subsequent call with `error`.
    pub fn failing_with(self, error: SessionError) -> Self {
        lock(&self.state).failure = Some(error);
        self
    }

    /// All calls received so far, in order.
    pub fn calls(&self) -> Vec<SessionCall> {
        lock(&self.calls).clone()
    }

    /// Orders received by `submit_order`.
    pub fn submitted_orders(&self) -> Vec<OrderSpec> {
        lock(&self.calls)
            .iter()
            .filter_map(|c| match c {
                SessionCall::SubmitOrder(o) => Some(o.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: SessionCall) -> Result<MutexGuard<'_, MockState>, SessionError> {
        lock(&self.calls).push(call);
        let state = lock(&self.state);
        if let Some(err) = state.failure.clone() {
            return Err(err);
        }
        Ok(state)
    }
}

/// Match a symbol against terminal group syntax: comma-separated patterns
/// with `*` wildcards, `!` excludes. Later patterns win.
pub(crate) fn matches_group(symbol: &str, group: &str) -> bool {
    let mut matched = false;
    for pattern in group.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match pattern.strip_prefix('!') {
            Some(excluded) if wildcard_match(excluded, symbol) => matched = false,
            Some(_) => {}
            None if wildcard_match(pattern, symbol) => matched = true,
            None => {}
        }
    }
    matched
}

fn wildcard_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }

    let mut rest = text;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(r) => rest = r,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}

#[async_trait]
impl TerminalSession for MockTerminalSession {
    async fn connect(&self) -> Result<(), SessionError> {
        self.record(SessionCall::Connect)?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), SessionError> {
        self.record(SessionCall::Disconnect)?;
        Ok(())
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, SessionError> {
        let state = self.record(SessionCall::GetQuote(symbol.to_string()))?;
        state
            .quotes
            .get(symbol)
            .cloned()
            .ok_or_else(|| SessionError::SymbolNotFound(symbol.to_string()))
    }

    async fn submit_order(&self, order: &OrderSpec) -> Result<Option<OrderResponse>, SessionError> {
        let state = self.record(SessionCall::SubmitOrder(order.clone()))?;
        Ok(state.order_reply.clone())
    }

    async fn deals_by_position(&self, position_ticket: u64) -> Result<Vec<Deal>, SessionError> {
        let state = self.record(SessionCall::DealsByPosition(position_ticket))?;
        Ok(state
            .position_deals
            .get(&position_ticket)
            .cloned()
            .unwrap_or_default())
    }

    async fn deal_by_ticket(&self, deal_ticket: u64) -> Result<Option<Deal>, SessionError> {
        let state = self.record(SessionCall::DealByTicket(deal_ticket))?;
        Ok(state.deals.get(&deal_ticket).cloned())
    }

    async fn order_by_ticket(
        &self,
        order_ticket: u64,
    ) -> Result<Option<HistoricalOrder>, SessionError> {
        let state = self.record(SessionCall::OrderByTicket(order_ticket))?;
        Ok(state.orders.get(&order_ticket).cloned())
    }

    async fn deals_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        group: &str,
    ) -> Result<Vec<Deal>, SessionError> {
        let state = self.record(SessionCall::DealsInRange(group.to_string()))?;
        let mut deals: Vec<Deal> = state
            .deals
            .values()
            .filter(|d| d.time >= from && d.time <= to && matches_group(&d.symbol, group))
            .cloned()
            .collect();
        deals.sort_by_key(|d| (d.time, d.ticket));
        Ok(deals)
    }

    async fn account_info(&self) -> Result<AccountInfo, SessionError> {
        let state = self.record(SessionCall::AccountInfo)?;
        state
            .account
            .clone()
            .ok_or_else(|| SessionError::Terminal {
                status: 500,
                message: "no account configured".to_string(),
            })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
