//! Terminal session over a JSON/HTTP terminal bridge.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::{Credentials, SessionConfig};
use crate::models::{AccountInfo, Deal, HistoricalOrder, OrderResponse, OrderSpec, Quote};

use super::types::*;
use super::{SessionError, TerminalSession};

/// Session against a terminal bridge that exposes the terminal over HTTP.
///
/// Each call is one HTTP request bounded by the configured timeout. No retries.
pub struct HttpTerminalSession {
    client: Client,
    base_url: String,
    credentials: Credentials,
    timeout: Duration,
}

impl HttpTerminalSession {
    /// Create a session. Does not contact the terminal until [`TerminalSession::connect`].
    pub fn new(credentials: Credentials, config: &SessionConfig) -> Result<Self, SessionError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SessionError::Connection(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
            timeout: config.timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request, mapping transport failures.
    async fn send(&self, request: RequestBuilder) -> Result<Response, SessionError> {
        request.send().await.map_err(|e| self.transport_error(e))
    }

    fn transport_error(&self, e: reqwest::Error) -> SessionError {
        if e.is_timeout() {
            SessionError::Timeout(self.timeout)
        } else if e.is_decode() {
            SessionError::Decode(e.to_string())
        } else {
            SessionError::Connection(e.to_string())
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, response: Response) -> Result<T, SessionError> {
        let response = Self::check_status(response).await?;
        response.json().await.map_err(|e| self.transport_error(e))
    }

    /// Single-record lookup: 404 or a `null` body means the record does not exist.
    async fn read_optional<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<Option<T>, SessionError> {
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.read_json::<Option<T>>(response).await
    }

    async fn check_status(response: Response) -> Result<Response, SessionError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(SessionError::Terminal {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl TerminalSession for HttpTerminalSession {
    async fn connect(&self) -> Result<(), SessionError> {
        let body = LoginRequest {
            login: self.credentials.login,
            password: &self.credentials.password,
            server: &self.credentials.server,
            timeout: self.timeout.as_millis() as u64,
        };

        let response = self
            .send(self.client.post(self.url("/session/login")).json(&body))
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let text = response.text().await.unwrap_or_default();
            return Err(SessionError::Authentication(text));
        }
        Self::check_status(response).await?;

        info!(login = self.credentials.login, server = %self.credentials.server, "Connected to terminal");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), SessionError> {
        let response = self.send(self.client.post(self.url("/session/logout"))).await?;
        Self::check_status(response).await?;

        debug!(login = self.credentials.login, "Disconnected from terminal");
        Ok(())
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, SessionError> {
        debug!(symbol = %symbol, "Fetching quote");

        let response = self
            .send(self.client.get(self.url("/symbol")).query(&[("name", symbol)]))
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SessionError::SymbolNotFound(symbol.to_string()));
        }

        let info: SymbolResponse = self.read_json(response).await?;
        Ok(info.into())
    }

    async fn submit_order(&self, order: &OrderSpec) -> Result<Option<OrderResponse>, SessionError> {
        let body = OrderSendRequest::from(order);

        let response = self
            .send(self.client.post(self.url("/orders")).json(&body))
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let reply: Option<OrderSendResponse> = self.read_json(response).await?;
        Ok(reply.map(Into::into))
    }

    async fn deals_by_position(&self, position_ticket: u64) -> Result<Vec<Deal>, SessionError> {
        debug!(position = position_ticket, "Fetching position deals");

        let response = self
            .send(
                self.client
                    .get(self.url("/history/deals"))
                    .query(&[("position", position_ticket)]),
            )
            .await?;

        let deals: Vec<DealResponse> = self.read_json(response).await?;
        deals.into_iter().map(Deal::try_from).collect()
    }

    async fn deal_by_ticket(&self, deal_ticket: u64) -> Result<Option<Deal>, SessionError> {
        let response = self
            .send(self.client.get(self.url(&format!("/history/deals/{}", deal_ticket))))
            .await?;

        let deal: Option<DealResponse> = self.read_optional(response).await?;
        deal.map(Deal::try_from).transpose()
    }

    async fn order_by_ticket(
        &self,
        order_ticket: u64,
    ) -> Result<Option<HistoricalOrder>, SessionError> {
        let response = self
            .send(self.client.get(self.url(&format!("/history/orders/{}", order_ticket))))
            .await?;

        let order: Option<HistoryOrderResponse> = self.read_optional(response).await?;
        order.map(HistoricalOrder::try_from).transpose()
    }

    async fn deals_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        group: &str,
    ) -> Result<Vec<Deal>, SessionError> {
        debug!(from = %from, to = %to, group = %group, "Fetching deal history");

        let response = self
            .send(self.client.get(self.url("/history/deals")).query(&[
                ("from", from.timestamp().to_string()),
                ("to", to.timestamp().to_string()),
                ("group", group.to_string()),
            ]))
            .await?;

        let deals: Vec<DealResponse> = self.read_json(response).await?;
        deals.into_iter().map(Deal::try_from).collect()
    }

    async fn account_info(&self) -> Result<AccountInfo, SessionError> {
        let response = self.send(self.client.get(self.url("/account"))).await?;
        let account: AccountResponse = self.read_json(response).await?;
        Ok(account.into())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
