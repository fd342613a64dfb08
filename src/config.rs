//! Gateway and session configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::FillMode;

/// Default terminal bridge address.
pub const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:8228";

/// Default per-request timeout, matching the terminal's own login timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Trade server login. The password is never printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Broker trade server name
    pub server: String,

    /// Account login id
    pub login: u64,

    /// Account password
    pub password: String,
}

impl Credentials {
    pub fn new(server: impl Into<String>, login: u64, password: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            login,
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("server", &self.server)
            .field("login", &self.login)
            .field("password", &"***")
            .finish()
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "login '{}' on server '{}'", self.login, self.server)
    }
}

/// Configuration of the trading gateway. Fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Server credentials used to open the session
    pub credentials: Credentials,

    /// Broker symbol suffix (e.g. "m#" turns "EURUSD" into "EURUSDm#")
    #[serde(default)]
    pub symbol_suffix: String,

    /// Filling policy for market orders, depends on the broker
    #[serde(default)]
    pub fill_mode: FillMode,
}

impl GatewayConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            symbol_suffix: String::new(),
            fill_mode: FillMode::default(),
        }
    }

    pub fn with_symbol_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.symbol_suffix = suffix.into();
        self
    }

    pub fn with_fill_mode(mut self, fill_mode: FillMode) -> Self {
        self.fill_mode = fill_mode;
        self
    }

    /// Terminal symbol for a plain pair name: upper-cased, suffix appended.
    pub fn terminal_symbol(&self, symbol: &str) -> String {
        format!("{}{}", symbol.trim().to_uppercase(), self.symbol_suffix)
    }
}

/// Connection settings of the HTTP terminal session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Base URL of the terminal bridge
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BRIDGE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_never_print_password() {
        let creds = Credentials::new("Broker-Demo", 5012345, "hunter2");

        let debug = format!("{:?}", creds);
        let display = creds.to_string();

        assert!(!debug.contains("hunter2"));
        assert!(!display.contains("hunter2"));
        assert!(debug.contains("5012345"));
        assert!(display.contains("Broker-Demo"));
    }

    #[test]
    fn test_terminal_symbol_applies_suffix() {
        let config = GatewayConfig::new(Credentials::new("Broker-Demo", 1, "pw"))
            .with_symbol_suffix("m#")
            .with_fill_mode(FillMode::Fok);

        assert_eq!(config.terminal_symbol("eurusd"), "EURUSDm#");
        assert_eq!(config.fill_mode, FillMode::Fok);

        let plain = GatewayConfig::new(Credentials::new("Broker-Demo", 1, "pw"));
        assert_eq!(plain.terminal_symbol("USDJPY"), "USDJPY");
        assert_eq!(plain.fill_mode, FillMode::Ioc);
    }

    #[test]
    fn test_session_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.base_url, DEFAULT_BRIDGE_URL);
        assert_eq!(config.timeout, Duration::from_secs(60));
    }
}
