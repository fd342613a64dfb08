//! MetaTrader 5 Gateway CLI
//!
//! Inspect quotes, validate entries, open market orders and look up trade
//! results through a terminal bridge.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use mt5_gateway::gateway::{pip_distance_with_unit, resolve_pip_unit};
use mt5_gateway::models::{
    Deal, FillMode, HistoricalOrder, OrderOutcome, TradeRequest, TradeSide,
    DEFAULT_MAX_SLIPPAGE_PIPS,
};
use mt5_gateway::{
    Credentials, DealStatistics, GatewayConfig, HttpTerminalSession, SessionConfig, TradeStatus,
    TradingGateway,
};

/// MetaTrader 5 gateway CLI.
#[derive(Parser)]
#[command(name = "mt5gw")]
#[command(about = "Trade MetaTrader 5 accounts through a terminal bridge", long_about = None)]
struct Cli {
    /// Terminal bridge URL
    #[arg(long, env = "MT5_BRIDGE_URL", default_value = "http://127.0.0.1:8228")]
    bridge_url: String,

    /// Trade server name
    #[arg(long, env = "MT5_SERVER")]
    server: Option<String>,

    /// Account login
    #[arg(long, env = "MT5_LOGIN")]
    login: Option<u64>,

    /// Account password
    #[arg(long, env = "MT5_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Broker symbol suffix
    #[arg(long, env = "MT5_SYMBOL_SUFFIX", default_value = "")]
    symbol_suffix: String,

    /// Order filling mode (IOC, FOK, RETURN)
    #[arg(long, env = "MT5_FILL_MODE", default_value = "IOC")]
    fill_mode: FillMode,

    /// Request timeout in seconds
    #[arg(long, env = "MT5_TIMEOUT_SECS", default_value = "60")]
    timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show account balance, equity and margins
    Account,

    /// Show the live quote for a symbol
    Quote {
        symbol: String,
    },

    /// Distance between two prices in pips (offline)
    Pips {
        a: Decimal,
        b: Decimal,

        /// Quote precision of the instrument, guessed from the price if omitted
        #[arg(long)]
        digits: Option<u32>,
    },

    /// Check an entry price against the live quote
    Check {
        symbol: String,
        side: TradeSide,
        entry: Decimal,

        /// Allowed distance from the live price in pips
        #[arg(short, long, default_value_t = DEFAULT_MAX_SLIPPAGE_PIPS)]
        max_slippage: u32,
    },

    /// Open a market position
    Open {
        symbol: String,
        side: TradeSide,
        volume: Decimal,
        entry: Decimal,

        /// Stop loss price
        #[arg(long)]
        sl: Decimal,

        /// Take profit price
        #[arg(long)]
        tp: Decimal,

        /// Allowed distance from the live price in pips
        #[arg(short, long, default_value_t = DEFAULT_MAX_SLIPPAGE_PIPS)]
        max_slippage: u32,

        /// Expert magic number
        #[arg(long)]
        magic: Option<u64>,

        /// Order comment
        #[arg(long, default_value = "")]
        note: String,
    },

    /// Show a deal by ticket
    Deal {
        ticket: u64,
    },

    /// Show a historical order by ticket
    Order {
        ticket: u64,
    },

    /// List the deals of a position
    Deals {
        ticket: u64,
    },

    /// Show the realized result of a position
    Result {
        ticket: u64,
    },

    /// Show whether a position is unknown, open, unfilled or closed
    Status {
        ticket: u64,
    },

    /// List deals in a date range
    History {
        /// Start date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        from: String,

        /// End date (YYYY-MM-DD or RFC 3339), defaults to now
        #[arg(long)]
        to: Option<String>,

        /// Symbol group filter, e.g. "*USD*,!EUR*"
        #[arg(short, long, default_value = "*")]
        group: String,

        /// Print performance statistics of the closing deals
        #[arg(long)]
        stats: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Commands::Pips { a, b, digits } = &cli.command {
        let unit = resolve_pip_unit(*digits, *a.max(b));
        println!("{} pips (pip = {})", pip_distance_with_unit(*a, *b, unit), unit);
        return Ok(());
    }

    let gateway = build_gateway(&cli)?;
    gateway
        .connect()
        .await
        .context("Failed to connect to the trade server")?;

    let outcome = run(&gateway, cli.command).await;

    if let Err(e) = gateway.disconnect().await {
        tracing::warn!(error = %e, "Failed to shut down terminal session");
    }
    outcome
}

fn build_gateway(cli: &Cli) -> Result<TradingGateway<HttpTerminalSession>> {
    let server = cli
        .server
        .clone()
        .context("Trade server is required (--server or MT5_SERVER)")?;
    let login = cli
        .login
        .context("Account login is required (--login or MT5_LOGIN)")?;
    let password = cli
        .password
        .clone()
        .context("Account password is required (--password or MT5_PASSWORD)")?;

    let credentials = Credentials::new(server, login, password);
    let session_config = SessionConfig {
        base_url: cli.bridge_url.clone(),
        timeout: Duration::from_secs(cli.timeout_secs),
    };
    let session = HttpTerminalSession::new(credentials.clone(), &session_config)
        .context("Failed to build terminal session")?;

    let config = GatewayConfig::new(credentials)
        .with_symbol_suffix(cli.symbol_suffix.clone())
        .with_fill_mode(cli.fill_mode);

    info!(bridge = %session.base_url(), fill_mode = %config.fill_mode, "Gateway configured");
    Ok(TradingGateway::new(session, config))
}

async fn run(gateway: &TradingGateway<HttpTerminalSession>, command: Commands) -> Result<()> {
    match command {
        Commands::Pips { .. } => {}

        Commands::Account => {
            let account = gateway.account().await.context("Failed to read account")?;
            let margins = account.margins();

            println!("\n=== Account {} @ {} ===", account.login, account.server);
            println!("Currency:      {}", account.currency);
            println!("Leverage:      1:{}", account.leverage);
            println!("Balance:       {:.2}", account.balance);
            println!("Equity:        {:.2}", account.equity);
            println!("Profit:        {:.2}", account.profit);
            println!("\n--- Margins ---");
            println!("Used:          {:.2}", margins.used);
            println!("Free:          {:.2}", margins.free);
            println!("Level:         {:.2}%", margins.level);
        }

        Commands::Quote { symbol } => {
            let quote = gateway
                .quote(&symbol)
                .await
                .with_context(|| format!("Failed to read quote for {}", symbol))?;

            println!("\n{:<16} {:>12} {:>12} {:>10}", "SYMBOL", "BID", "ASK", "SPREAD");
            println!("{}", "-".repeat(53));
            println!(
                "{:<16} {:>12} {:>12} {:>10}",
                quote.symbol,
                quote.bid,
                quote.ask,
                quote.spread()
            );
        }

        Commands::Check {
            symbol,
            side,
            entry,
            max_slippage,
        } => {
            let check = gateway
                .check_entry(&symbol, entry, side, max_slippage)
                .await
                .with_context(|| format!("Failed to check entry for {}", symbol))?;

            println!("\n=== {} {} @ {} ===", side, check.quote.symbol, entry);
            println!("Live price:    {}", check.reference_price);
            println!("Pip:           {}", check.pip_unit);
            println!("Distance:      {} pips (max {})", check.distance_pips, max_slippage);
            println!("Entry valid:   {}", if check.is_valid() { "Yes" } else { "No" });
        }

        Commands::Open {
            symbol,
            side,
            volume,
            entry,
            sl,
            tp,
            max_slippage,
            magic,
            note,
        } => {
            let mut request = TradeRequest::new(symbol, side, volume, entry, sl, tp)
                .with_max_slippage_pips(max_slippage)
                .with_note(note);
            if let Some(magic) = magic {
                request = request.with_magic(magic);
            }

            match gateway.submit(&request).await.context("Failed to submit order")? {
                OrderOutcome::Accepted(fill) => {
                    println!("\nOrder filled");
                    println!("  Ticket:      {}", fill.ticket);
                    println!("  Deal:        {}", fill.deal);
                    println!("  Volume:      {}", fill.volume);
                    println!("  Price:       {}", fill.fill_price);
                }
                OrderOutcome::Rejected(rejection) => {
                    let code = rejection
                        .raw_code
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!("\nOrder rejected: {}", rejection.reason);
                    println!("  Retcode:     {}", code);
                    println!("  Message:     {}", rejection.message);
                    anyhow::bail!("order was not opened");
                }
            }
        }

        Commands::Deal { ticket } => {
            let deal = gateway
                .deal(ticket)
                .await
                .context("Failed to read deal")?
                .ok_or_else(|| anyhow::anyhow!("Deal {} not found", ticket))?;
            print_deals(&[deal]);
        }

        Commands::Order { ticket } => {
            let order = gateway
                .order(ticket)
                .await
                .context("Failed to read order")?
                .ok_or_else(|| anyhow::anyhow!("Order {} not found", ticket))?;
            print_order(&order);
        }

        Commands::Deals { ticket } => {
            let deals = gateway
                .order_deals(ticket)
                .await
                .context("Failed to read position deals")?;
            if deals.is_empty() {
                println!("No deals for position {}", ticket);
                return Ok(());
            }
            print_deals(&deals);
        }

        Commands::Result { ticket } => {
            match gateway
                .resolve_result(ticket)
                .await
                .context("Failed to resolve trade result")?
            {
                Some(result) => {
                    print_deals(&[result.closing_deal.clone()]);
                    println!("\nNet profit:    {:.2}", result.net_profit);
                    if result.is_partial() {
                        println!(
                            "Note: position closed in {} deals, only the last is shown",
                            result.deal_count - 1
                        );
                    }
                }
                None => println!("Position {} has no result yet (open or unknown)", ticket),
            }
        }

        Commands::Status { ticket } => {
            match gateway
                .trade_status(ticket)
                .await
                .context("Failed to read trade status")?
            {
                TradeStatus::Unknown => println!("Position {}: unknown ticket", ticket),
                TradeStatus::Open { deals } => {
                    println!("Position {}: open ({} deals)", ticket, deals)
                }
                TradeStatus::NotFilled(state) => {
                    println!("Position {}: order ended without a fill ({:?})", ticket, state)
                }
                TradeStatus::Closed(result) => println!(
                    "Position {}: closed by deal {}, net profit {:.2}",
                    ticket, result.closing_deal.ticket, result.net_profit
                ),
            }
        }

        Commands::History {
            from,
            to,
            group,
            stats,
        } => {
            let from = parse_time(&from)?;
            let to = match to {
                Some(t) => parse_time(&t)?,
                None => Utc::now(),
            };

            let deals = gateway
                .history(from, to, &group)
                .await
                .context("Failed to read deal history")?;
            if deals.is_empty() {
                println!("No deals between {} and {}", from, to);
                return Ok(());
            }
            print_deals(&deals);

            if stats {
                let s = DealStatistics::calculate(&deals);
                println!("\n--- Performance ---");
                println!("Closed Deals:   {}", s.closed_deals);
                println!("Win Rate:       {:.1}%", s.win_rate * 100.0);
                println!("Wins / Losses:  {} / {}", s.wins, s.losses);
                println!("Net Profit:     {:.2}", s.total_net_profit);
                println!("Avg Win:        {:.2}", s.avg_win);
                println!("Avg Loss:       {:.2}", s.avg_loss);
                println!("Profit Factor:  {:.2}", s.profit_factor);
                println!("Std Dev:        {:.2}", s.std_dev_net_profit);
                println!("Max Drawdown:   {:.2}", s.max_drawdown);
            }
        }
    }

    Ok(())
}

fn parse_time(text: &str) -> Result<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Ok(t.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD or RFC 3339", text))?;
    let midnight = date.and_hms_opt(0, 0, 0).context("Invalid date")?;
    Ok(Utc.from_utc_datetime(&midnight))
}

fn print_deals(deals: &[Deal]) {
    println!(
        "\n{:<12} {:<12} {:<20} {:<12} {:<5} {:<6} {:>8} {:>12} {:>10}",
        "DEAL", "POSITION", "TIME", "SYMBOL", "SIDE", "ENTRY", "VOLUME", "PRICE", "NET"
    );
    println!("{}", "-".repeat(105));

    for d in deals {
        let side = d.side.map(|s| s.as_str()).unwrap_or("-");
        println!(
            "{:<12} {:<12} {:<20} {:<12} {:<5} {:<6} {:>8} {:>12} {:>10.2}",
            d.ticket,
            d.position_id,
            d.time.format("%Y-%m-%d %H:%M:%S"),
            truncate(&d.symbol, 12),
            side,
            format!("{:?}", d.entry),
            d.volume,
            d.price,
            d.net_profit()
        );
    }
}

fn print_order(order: &HistoricalOrder) {
    let side = order.side.map(|s| s.as_str()).unwrap_or("-");

    println!("\n=== Order {} ===", order.ticket);
    println!("Position:      {}", order.position_id);
    println!("Symbol:        {}", order.symbol);
    println!("Side:          {}", side);
    println!("State:         {:?}", order.state);
    println!("Placed:        {}", order.time_setup);
    if let Some(done) = order.time_done {
        println!("Done:          {}", done);
    }
    println!("Volume:        {} / {}", order.volume_current, order.volume_initial);
    println!("Price:         {}", order.price_open);
    println!("SL / TP:       {} / {}", order.stop_loss, order.take_profit);
    println!("Magic:         {}", order.magic);
    if !order.comment.is_empty() {
        println!("Comment:       {}", order.comment);
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
